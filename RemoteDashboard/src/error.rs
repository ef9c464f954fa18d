// RemoteDashboard/src/error.rs

//! 控制台应用的错误类型。

use std::fmt;

use common_models::enums::DeviceProfile;
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::{Response, STATUS_WARNING};
use thiserror::Error;

/// 远程失败的分类，供调用方决定是否值得重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 暂时性失败 (设备忙、服务器给出 warning 等)，稍后重试可能成功。
    Transient,
    /// 永久性失败，重试不会改变结果。
    Permanent,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Transient => f.write_str("transient"),
            FailureClass::Permanent => f.write_str("permanent"),
        }
    }
}

/// 服务器以非零状态码回应的一条命令。
#[derive(Debug, Clone, PartialEq, Error)]
#[error("远程事件 '{event}' 执行失败 (status={status}, {class}): {message}")]
pub struct RemoteFailure {
    pub event: String,
    pub status: i64,
    pub message: String,
    pub class: FailureClass,
}

impl RemoteFailure {
    /// 从失败的响应构建；成功响应返回 `None`。
    ///
    /// `params.retryable == true` 或 warning 状态码视为暂时性失败。
    pub fn from_response(response: &Response) -> Option<Self> {
        if response.is_success() {
            return None;
        }
        let retryable = response
            .param("retryable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let class = if retryable || response.status == STATUS_WARNING {
            FailureClass::Transient
        } else {
            FailureClass::Permanent
        };
        Some(RemoteFailure {
            event: response.event.clone(),
            status: response.status,
            message: response.message_text().to_string(),
            class,
        })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket 错误: {0}")]
    Ws(#[from] WsError),

    #[error("未连接到远程服务器")]
    NotConnected,

    #[error("事件 '{event}' 不在 {profile} 配置档的事件注册表中")]
    UnknownEvent { event: String, profile: DeviceProfile },

    #[error(transparent)]
    RemoteFailure(#[from] RemoteFailure),

    #[error("等待事件 '{event}' 的响应超时 ({timeout_ms} ms)")]
    Timeout { event: String, timeout_ms: u64 },

    #[error("连接在等待响应期间断开")]
    Disconnected,

    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 该错误是否可能在稍后重试时消失。
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::RemoteFailure(failure) => failure.class == FailureClass::Transient,
            AppError::Timeout { .. } | AppError::Disconnected => true,
            AppError::Ws(e) => e.is_transport(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_websocket_utils::message::decode;

    #[test]
    fn test_success_response_is_not_a_failure() {
        let response = decode(r#"{"event":"RemoteConnect","status":0}"#).expect("解码失败");
        assert!(RemoteFailure::from_response(&response).is_none());
    }

    #[test]
    fn test_failure_classification() {
        let permanent = decode(r#"{"event":"RemoteConnect","status":1,"message":"no such camera"}"#).expect("解码失败");
        let failure = RemoteFailure::from_response(&permanent).expect("应为失败响应");
        assert_eq!(failure.class, FailureClass::Permanent);
        assert_eq!(failure.message, "no such camera");
        assert!(!AppError::from(failure).is_transient());

        let warning = decode(r#"{"event":"RemoteStartExposure","status":"warning","message":"busy"}"#).expect("解码失败");
        let failure = RemoteFailure::from_response(&warning).expect("应为失败响应");
        assert_eq!(failure.class, FailureClass::Transient);

        let retryable =
            decode(r#"{"event":"RemoteCooling","status":1,"params":{"retryable":true}}"#).expect("解码失败");
        let failure = RemoteFailure::from_response(&retryable).expect("应为失败响应");
        assert_eq!(failure.class, FailureClass::Transient);
        assert!(AppError::from(failure).is_transient());
    }

    #[test]
    fn test_timeouts_and_disconnects_are_transient() {
        assert!(AppError::Timeout { event: "RemotePolling".to_string(), timeout_ms: 10 }.is_transient());
        assert!(AppError::Disconnected.is_transient());
        assert!(!AppError::NotConnected.is_transient());
        assert!(!AppError::InvalidInput("x".to_string()).is_transient());
    }

    #[test]
    fn test_unknown_event_message_names_profile() {
        let err = AppError::UnknownEvent { event: "RemoteCooling".to_string(), profile: DeviceProfile::Focuser };
        let text = err.to_string();
        assert!(text.contains("RemoteCooling") && text.contains("Focuser"), "错误信息: {}", text);
    }
}
