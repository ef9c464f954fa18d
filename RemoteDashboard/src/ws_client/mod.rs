// RemoteDashboard/src/ws_client/mod.rs

//! 与远程设备服务器通信的 WebSocket 客户端逻辑。
//!
//! - `registry`: 事件名称到分类索引的映射，按设备配置档区分。
//! - `dispatcher` / `handlers`: 入站响应的路由与各事件的状态更新。
//! - `pending`: 按 uid 关联请求与响应。
//! - `service`: `RemoteSession`，负责连接生命周期、轮询与命令发送。

pub mod dispatcher;
pub mod handlers;
pub mod pending;
pub mod registry;
pub mod service;

pub use dispatcher::{DispatchContext, DispatchOutcome, Dispatcher, Handler};
pub use service::{RemoteSession, SessionOptions};
