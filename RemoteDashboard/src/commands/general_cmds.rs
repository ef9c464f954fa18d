// RemoteDashboard/src/commands/general_cmds.rs

//! 与设备种类无关的命令：设备断开/重连/扫描、配置读写。

use common_models::ws_payloads::{
    EmptyParams, REMOTE_DISCONNECT, REMOTE_GET_CONFIGURATION, REMOTE_RECONNECT, REMOTE_SCANNING,
    REMOTE_SET_CONFIGURATION,
};
use log::warn;
use serde_json::Value;

use crate::error::AppError;
use crate::ws_client::RemoteSession;

async fn warn_if_device_offline(session: &RemoteSession, event: &str) {
    if !session.state().await.device_connected {
        warn!("[命令] 设备未连接，仍然发送 {}。", event);
    }
}

/// 断开设备。设备未连接时只给出警告，命令照常发送。
pub async fn device_disconnect(session: &RemoteSession) -> Result<String, AppError> {
    warn_if_device_offline(session, REMOTE_DISCONNECT).await;
    session.send_command(REMOTE_DISCONNECT, &EmptyParams {}).await
}

pub async fn device_reconnect(session: &RemoteSession) -> Result<String, AppError> {
    warn_if_device_offline(session, REMOTE_RECONNECT).await;
    session.send_command(REMOTE_RECONNECT, &EmptyParams {}).await
}

pub async fn device_scanning(session: &RemoteSession) -> Result<String, AppError> {
    warn_if_device_offline(session, REMOTE_SCANNING).await;
    session.send_command(REMOTE_SCANNING, &EmptyParams {}).await
}

/// 读取配置。`params` 的结构由服务器定义。
pub async fn get_configuration(session: &RemoteSession, params: &Value) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_CONFIGURATION, params).await
}

pub async fn set_configuration(session: &RemoteSession, params: &Value) -> Result<String, AppError> {
    session.send_command(REMOTE_SET_CONFIGURATION, params).await
}
