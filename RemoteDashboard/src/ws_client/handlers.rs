// RemoteDashboard/src/ws_client/handlers.rs

//! 各事件的响应处理函数。
//!
//! 处理函数在连接任务中被同步调用，只修改会话状态并通知界面，不执行 I/O。
//! 失败响应 (status 非 0) 会被记录并以 `SessionEvent::RemoteFailure` 通知界面，
//! 乐观设置的标志随之回滚。

use common_models::ws_payloads::*;
use log::{debug, info, warn};
use rust_websocket_utils::message::Response;

use crate::error::RemoteFailure;
use crate::event::SessionEvent;
use crate::ws_client::dispatcher::{DispatchContext, Handler};

/// 默认处理表。每个相机事件恰好对应一个处理函数；其他配置档只取用其中属于自己的条目。
pub fn default_table() -> Vec<(&'static str, Handler)> {
    vec![
        (REMOTE_START_SERVER, on_unhandled as Handler),
        (REMOTE_STOP_SERVER, on_unhandled),
        (REMOTE_SHUTDOWN_SERVER, on_unhandled),
        (REMOTE_RESTART_SERVER, on_unhandled),
        (REMOTE_DASHBOARD_SETUP, on_dashboard_setup),
        (REMOTE_CONNECT, on_connect),
        (REMOTE_DISCONNECT, on_disconnect),
        (REMOTE_RECONNECT, on_reconnect),
        (REMOTE_SCANNING, on_unhandled),
        (REMOTE_POLLING, on_polling),
        (REMOTE_START_EXPOSURE, on_start_exposure),
        (REMOTE_ABORT_EXPOSURE, on_abort_exposure),
        (REMOTE_GET_EXPOSURE_STATUS, on_exposure_report),
        (REMOTE_GET_EXPOSURE_RESULT, on_exposure_report),
        (REMOTE_START_SEQUENCE_EXPOSURE, on_start_sequence),
        (REMOTE_ABORT_SEQUENCE_EXPOSURE, on_halt_sequence),
        (REMOTE_PAUSE_SEQUENCE_EXPOSURE, on_halt_sequence),
        (REMOTE_CONTINUE_SEQUENCE_EXPOSURE, on_continue_sequence),
        (REMOTE_GET_SEQUENCE_EXPOSURE_STATUS, on_unhandled),
        (REMOTE_GET_SEQUENCE_EXPOSURE_RESULTS, on_unhandled),
        (REMOTE_COOLING, on_unhandled),
        (REMOTE_COOLING_TO, on_unhandled),
        (REMOTE_GET_COOLING_STATUS, on_unhandled),
        (REMOTE_GET_CONFIGURATION, on_unhandled),
        (REMOTE_SET_CONFIGURATION, on_unhandled),
    ]
}

/// 记录失败响应并通知界面。响应失败时返回 `true`。
fn report_failure(ctx: &DispatchContext<'_>, response: &Response) -> bool {
    match RemoteFailure::from_response(response) {
        Some(failure) => {
            warn!("[响应处理] {}", failure);
            ctx.notify(SessionEvent::RemoteFailure {
                event: failure.event,
                status: failure.status,
                message: failure.message,
            });
            true
        }
        None => false,
    }
}

fn parse_info(response: &Response) -> Option<DeviceInfo> {
    let raw = response.param("info")?;
    match serde_json::from_value::<DeviceInfo>(raw.clone()) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("[响应处理] 事件 '{}' 的设备信息无法解析: {}", response.event, e);
            None
        }
    }
}

/// 扩展点：协议没有为客户端定义行为的事件。只记录日志。
pub fn on_unhandled(_ctx: &mut DispatchContext<'_>, response: &Response) {
    debug!(
        "[响应处理] 事件 '{}' 无默认行为 (status={}, message='{}')",
        response.event,
        response.status,
        response.message_text()
    );
}

pub fn on_dashboard_setup(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    let version = match response.deserialize_params::<DashboardSetupPayload>() {
        Ok(payload) => payload.version,
        // 非字符串的版本号按原样记录
        Err(_) => response.param("version").filter(|v| !v.is_null()).map(|v| v.to_string()),
    };
    info!("[响应处理] 控制台初始化完成，服务器版本: {:?}", version);
    ctx.state.server_version = version;
    ctx.notify_state(&response.event);
}

pub fn on_connect(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    match parse_info(response) {
        Some(info) => {
            info!("[响应处理] 设备已连接: {:?}", info.name);
            ctx.state.device_initialized = true;
            ctx.state.device_connected = true;
            ctx.state.device_info = Some(info);
            ctx.notify_state(&response.event);
        }
        None => {
            warn!("[响应处理] RemoteConnect 成功但未携带设备信息，状态保持不变。");
        }
    }
}

pub fn on_disconnect(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    info!("[响应处理] 设备已断开。");
    ctx.state.device_connected = false;
    ctx.state.device_initialized = false;
    ctx.state.device_info = None;
    ctx.notify_state(&response.event);
}

pub fn on_reconnect(ctx: &mut DispatchContext<'_>, response: &Response) {
    let failed = report_failure(ctx, response);
    ctx.state.device_connected = !failed;
    ctx.notify_state(&response.event);
}

pub fn on_polling(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) || !ctx.state.device_initialized {
        return;
    }
    if let Some(info) = parse_info(response) {
        ctx.state.device_info = Some(info);
        ctx.notify_state(&response.event);
    }
}

pub fn on_start_exposure(ctx: &mut DispatchContext<'_>, response: &Response) {
    let failed = report_failure(ctx, response);
    ctx.state.exposure_in_progress = !failed;
    ctx.notify_state(&response.event);
}

pub fn on_abort_exposure(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    ctx.state.exposure_in_progress = false;
    ctx.notify_state(&response.event);
}

/// 曝光状态与结果查询：只记录。
pub fn on_exposure_report(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    info!("[响应处理] {}: {}", response.event, response.params);
}

pub fn on_start_sequence(ctx: &mut DispatchContext<'_>, response: &Response) {
    let failed = report_failure(ctx, response);
    ctx.state.sequence_in_progress = !failed;
    ctx.notify_state(&response.event);
}

/// 中止或暂停序列曝光。
pub fn on_halt_sequence(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    ctx.state.sequence_in_progress = false;
    ctx.notify_state(&response.event);
}

pub fn on_continue_sequence(ctx: &mut DispatchContext<'_>, response: &Response) {
    if report_failure(ctx, response) {
        return;
    }
    ctx.state.sequence_in_progress = true;
    ctx.notify_state(&response.event);
}
