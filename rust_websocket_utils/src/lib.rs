//! `rust_websocket_utils` 提供远程设备协议的 WebSocket 通信实用功能。
//!
//! 主要模块包括：
//! - `message`: 出站信封 `Envelope`、入站响应 `Response`、uid 生成以及编解码 (含 `NaN` 垫片)。
//! - `error`: 库中统一使用的错误类型 `WsError`。
//! - `client`: WebSocket 客户端传输层 (连接、发送文本帧、接收并解码)。
//! - `server`: WebSocket 服务器端传输层，主要用于在测试中模拟远程设备服务器。

pub mod client;
pub mod error;
pub mod message;
pub mod server;

pub use error::WsError;
pub use message::{decode, encode, generate_uid, Envelope, Response};
