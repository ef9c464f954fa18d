// RemoteDashboard/src/commands/focuser_cmds.rs

use common_models::ws_payloads::REMOTE_CONNECT;
use log::info;

use crate::commands::ConnectForm;
use crate::error::AppError;
use crate::ws_client::RemoteSession;

pub const DEFAULT_FOCUSER_NAME: &str = "focuser";

/// 请求远程服务器连接调焦器。
pub async fn focuser_connect(session: &RemoteSession, form: ConnectForm) -> Result<String, AppError> {
    let params = form.into_params(DEFAULT_FOCUSER_NAME);
    info!(
        "[调焦器命令] 尝试连接调焦器 {}:{} ({}, {})",
        params.host, params.port, params.name, params.device_type
    );
    session.send_command(REMOTE_CONNECT, &params).await
}
