// rust_websocket_utils/src/error.rs

//! 定义 WebSocket 工具库相关的错误类型。

use thiserror::Error;

/// 本库所有操作共享的错误类型。
///
/// 底层 `tungstenite` 错误 (即传输错误) 与 I/O 错误通过 `#[from]` 自动转换，
/// 编码、解码等错误以字符串承载上下文信息。
#[derive(Error, Debug)]
pub enum WsError {
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 入站帧不是合法的 JSON，或不符合响应结构。调用方应记录并丢弃该帧。
    #[error("解码错误: {0}")]
    DecodeError(String),

    #[error("WebSocket协议错误: {0}")]
    WebSocketProtocolError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("I/O错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("发送错误: 通道已关闭")]
    SendErrorClosed,

    #[error("连接超时")]
    ConnectionTimeout,

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("未连接")]
    NotConnected,

    #[error("消息错误: {0}")]
    Message(String),
}

impl WsError {
    /// 是否属于传输层错误 (连接被重置、协议违规等)。
    pub fn is_transport(&self) -> bool {
        matches!(self, WsError::WebSocketProtocolError(_) | WsError::IoError(_))
    }
}
