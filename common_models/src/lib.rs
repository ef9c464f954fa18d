//! `common_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了远程成像设备控制台 (`RemoteDashboard`) 与远程设备服务器之间
//! 共享的协议词汇和数据结构：
//! - **事件词汇 (`ws_payloads`)**: 所有 `Remote*` 事件名称常量，以及命令参数
//!   (如 `ConnectParams`、`ExposureParams`) 和响应负载 (如 `DashboardSetupPayload`、`DeviceInfo`)。
//! - **通用枚举 (`enums`)**: 设备配置档 (`DeviceProfile`，决定会话可用的事件注册表)、
//!   设备驱动类型 (`DeviceType`) 等。
//!
//! 所有模型都派生 `Serialize`/`Deserialize`/`Debug`/`Clone`，以便在 JSON 线格式与 Rust 类型之间转换。

pub mod enums; // 设备配置档与驱动类型等通用枚举
pub mod ws_payloads; // 事件名称常量与各类命令/响应负载
