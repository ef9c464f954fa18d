// RemoteDashboard/src/commands/mod.rs

//! 面向界面操作的命令封装。
//!
//! 每个函数对应界面上的一个按钮：先依据会话状态和表单输入做检查，
//! 再通过 `RemoteSession::send_command` 发出命令，成功时返回命令的 uid。
//! 命令的结果由响应处理器异步反映到会话状态中。

pub mod camera_cmds;
pub mod focuser_cmds;
pub mod general_cmds;

use common_models::enums::DeviceType;
use common_models::ws_payloads::ConnectParams;
use serde::Deserialize;

pub const DEFAULT_DEVICE_HOST: &str = "127.0.0.1";
pub const DEFAULT_DEVICE_PORT: u16 = 11111;

/// 设备连接表单。空白字段使用默认值。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectForm {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<DeviceType>,
}

impl ConnectForm {
    /// 补齐默认值，生成 `RemoteConnect` 参数。`default_name` 随设备种类不同。
    pub fn into_params(self, default_name: &str) -> ConnectParams {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        ConnectParams {
            host: non_blank(self.host).unwrap_or_else(|| DEFAULT_DEVICE_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_DEVICE_PORT),
            name: non_blank(self.name).unwrap_or_else(|| default_name.to_string()),
            device_type: self.device_type.unwrap_or(DeviceType::Ascom),
        }
    }
}
