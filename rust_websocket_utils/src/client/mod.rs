// rust_websocket_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! `transport` 子模块封装 `tokio-tungstenite` 的连接建立、文本帧发送与入站帧解码，
//! 上层会话只需处理 `Envelope` 与 `Response`。

pub mod transport;
