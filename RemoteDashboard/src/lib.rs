//! `RemoteDashboard` 远程成像设备控制台的核心库 (`app_lib`)。
//!
//! 控制台通过 WebSocket 驱动远程设备服务器 (相机、调焦器、赤道仪)：
//! 发送 `{event, uid, params}` 命令信封，接收 `{event, status, message, params}` 响应，
//! 并把设备状态以 `SessionEvent` 通知给界面协作方。

pub mod commands; // 面向界面按钮的命令封装
pub mod config; // 配置文件与本地存储
pub mod error; // AppError 与远程失败分类
pub mod event; // 发给界面的会话通知
pub mod state; // 会话状态
pub mod ws_client; // 注册表、分发器、处理函数、待决请求与连接会话

pub use error::AppError;
pub use ws_client::{RemoteSession, SessionOptions};
