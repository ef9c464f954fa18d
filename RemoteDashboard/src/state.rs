// RemoteDashboard/src/state.rs

//! 会话状态。
//!
//! `SessionState` 由 `RemoteSession` 持有 (`Arc<RwLock<..>>`)，只在连接任务、响应处理器
//! 以及短暂的连接/断开过渡中被修改。外部通过 `RemoteSession::state()` 获得快照。

use chrono::{DateTime, Utc};
use common_models::ws_payloads::DeviceInfo;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SessionState {
    pub connection: ConnectionState,
    /// 远程服务器报告设备已连接。
    pub device_connected: bool,
    /// 已收到过完整的设备信息。
    pub device_initialized: bool,
    pub exposure_in_progress: bool,
    pub sequence_in_progress: bool,
    pub polling_active: bool,
    /// 由 `RemoteDashboardSetup` 响应给出的服务器版本。
    pub server_version: Option<String>,
    pub device_info: Option<DeviceInfo>,
    /// 最近一次收到 `RemotePolling` 响应的时间。
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// 连接关闭后清除所有依赖连接的派生状态。
    pub fn reset_connection(&mut self) {
        *self = SessionState::default();
    }

    /// 当前是否有曝光或序列曝光在进行。
    pub fn is_busy(&self) -> bool {
        self.exposure_in_progress || self.sequence_in_progress
    }
}
