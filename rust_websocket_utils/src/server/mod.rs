// rust_websocket_utils/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! `transport` 子模块负责监听、握手，并将每个建立好的连接交给调用方提供的回调处理。
//! 控制台本身不充当服务器，此模块用于在集成测试中模拟远程设备服务器。

pub mod transport;
