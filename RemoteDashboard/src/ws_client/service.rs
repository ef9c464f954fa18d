// RemoteDashboard/src/ws_client/service.rs

//! 与远程设备服务器之间的连接会话。
//!
//! 每个连接由一个任务驱动，任务内部用 `tokio::select!` 同时等待入站帧、轮询定时器和
//! 关闭请求，因此打开、关闭、消息与轮询事件不会交错执行。
//!
//! 生命周期：
//! - `connect()`: 建立传输，状态置为 `Connected`，发送 `RemoteDashboardSetup`，启动轮询并通知界面。
//! - 连接任务：解码入站帧，按 uid 完成待决请求，再交给分发器；每个轮询周期发送一次 `RemotePolling`。
//! - 关闭 (对端关闭、传输错误或 `disconnect()`): 清除连接相关状态，停止轮询，
//!   以 `Disconnected` 结束所有待决请求，并通知界面。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common_models::enums::DeviceProfile;
use common_models::ws_payloads::{EmptyParams, REMOTE_DASHBOARD_SETUP, REMOTE_POLLING};
use log::{debug, error, info, warn};
use rust_websocket_utils::client::transport::{self, ClientConnection, ClientSink, ClientSource};
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::{Envelope, Response};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot, Mutex as TokioMutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::{AppConfig, LocalStorage, HOST_KEY};
use crate::error::AppError;
use crate::event::{SessionEvent, SESSION_EVENT_CAPACITY};
use crate::state::{ConnectionState, SessionState};
use crate::ws_client::dispatcher::{DispatchContext, DispatchOutcome, Dispatcher, Handler};
use crate::ws_client::pending::PendingRequests;

/// `disconnect()` 等待连接任务完成关闭处理的最长时间。
pub const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(3);
/// 建立连接 (含握手) 的超时。
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 会话参数。
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub profile: DeviceProfile,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            use_tls: config.use_tls,
            profile: config.device_profile,
            poll_interval: config.poll_interval(),
            request_timeout: config.request_timeout(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// 会话与连接任务共享的部分。
#[derive(Clone)]
struct SessionShared {
    state: Arc<RwLock<SessionState>>,
    ws_send_channel: Arc<TokioMutex<Option<ClientSink>>>,
    dispatcher: Arc<RwLock<Dispatcher>>,
    pending: PendingRequests,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionShared {
    fn notify(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// 检查事件与连接状态，构建信封。
    async fn prepare<T: Serialize>(&self, event: &str, params: &T) -> Result<Envelope, AppError> {
        {
            let dispatcher = self.dispatcher.read().await;
            let registry = dispatcher.registry();
            if !registry.contains(event) {
                return Err(AppError::UnknownEvent {
                    event: event.to_string(),
                    profile: registry.profile(),
                });
            }
        }
        if !self.state.read().await.is_connected() {
            return Err(AppError::NotConnected);
        }
        Ok(Envelope::new(event, params)?)
    }

    async fn transmit(&self, envelope: &Envelope) -> Result<(), AppError> {
        let mut guard = self.ws_send_channel.lock().await;
        let sink = guard.as_mut().ok_or(AppError::NotConnected)?;
        transport::send_envelope(sink, envelope).await?;
        Ok(())
    }

    async fn send_polling(&self) -> Result<(), AppError> {
        let envelope = Envelope::new(REMOTE_POLLING, &EmptyParams {})?;
        self.transmit(&envelope).await
    }

    async fn on_message(&self, response: Response) {
        // 轮询响应只刷新存活时间戳，是否分发由分发器决定
        if response.event == REMOTE_POLLING {
            self.state.write().await.last_polled_at = Some(Utc::now());
            self.notify(SessionEvent::Polled);
        }
        // 先交付给按 uid 等待的请求，再走分发流程
        if self.pending.resolve(&response).await {
            debug!("[会话] 响应 '{}' 已交付给等待中的请求。", response.event);
        }
        let dispatcher = self.dispatcher.read().await;
        let mut state = self.state.write().await;
        let mut ctx = DispatchContext::new(&mut state, &self.events);
        match dispatcher.dispatch(&mut ctx, &response) {
            DispatchOutcome::Handled(event) => debug!("[会话] 事件 '{}' 已处理。", event),
            DispatchOutcome::Suppressed => {}
            DispatchOutcome::Unroutable | DispatchOutcome::NoHandler => {
                debug!("[会话] 事件 '{}' 未被处理。", response.event)
            }
        }
    }

    /// 关闭处理。可重复调用，只有第一次会发出通知。
    async fn on_close(&self, reason: Option<String>) {
        // 先丢弃发送端，之后的发送都会得到 NotConnected
        *self.ws_send_channel.lock().await = None;
        let was_connected = {
            let mut state = self.state.write().await;
            let was_connected = state.is_connected();
            if was_connected {
                state.reset_connection();
            }
            was_connected
        };
        self.pending.fail_all().await;
        if was_connected {
            info!("[会话] 连接已关闭: {}", reason.as_deref().unwrap_or("未知原因"));
            self.notify(SessionEvent::ConnectionChanged {
                connected: false,
                url: None,
                reason,
            });
        }
    }

    /// 连接任务主体。
    async fn run_connection(self, mut ws_receiver: ClientSource, mut close_rx: oneshot::Receiver<()>, poll_interval: Duration) {
        // 第一次轮询在打开后一个周期发出
        let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("[会话] (连接任务) 已启动，轮询间隔 {:?}。", poll_interval);

        let reason = loop {
            tokio::select! {
                incoming = transport::receive_message(&mut ws_receiver) => match incoming {
                    Some(Ok(response)) => self.on_message(response).await,
                    Some(Err(e @ (WsError::DecodeError(_) | WsError::Message(_)))) => {
                        warn!("[会话] (连接任务) 丢弃无法解析的帧: {}", e);
                    }
                    Some(Err(e)) => {
                        error!("[会话] (连接任务) 传输错误: {}", e);
                        break format!("传输错误: {}", e);
                    }
                    None => break "连接已由对方关闭".to_string(),
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.send_polling().await {
                        warn!("[会话] (连接任务) 发送轮询失败: {}", e);
                    }
                }
                // disconnect() 请求关闭
                _ = &mut close_rx => {
                    if let Some(sink) = self.ws_send_channel.lock().await.as_mut() {
                        if let Err(e) = transport::close(sink).await {
                            warn!("[会话] (连接任务) 发送关闭帧失败: {}", e);
                        }
                    }
                    break "客户端主动断开".to_string();
                }
            }
        };
        self.on_close(Some(reason)).await;
        info!("[会话] (连接任务) 已结束。");
    }
}

/// 与远程设备服务器的一次会话。
pub struct RemoteSession {
    options: SessionOptions,
    shared: SessionShared,
    storage: Option<Arc<TokioMutex<LocalStorage>>>,
    connection_task_handle: TokioMutex<Option<JoinHandle<()>>>,
    close_tx: TokioMutex<Option<oneshot::Sender<()>>>,
    // 串行化 connect/disconnect，保证任意时刻至多一个传输
    lifecycle_lock: TokioMutex<()>,
}

impl RemoteSession {
    pub fn new(options: SessionOptions) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        info!("[会话] 正在初始化 ({} 配置档)...", options.profile);
        Self {
            shared: SessionShared {
                state: Arc::new(RwLock::new(SessionState::default())),
                ws_send_channel: Arc::new(TokioMutex::new(None)),
                dispatcher: Arc::new(RwLock::new(Dispatcher::with_default_handlers(options.profile))),
                pending: PendingRequests::new(),
                events,
            },
            options,
            storage: None,
            connection_task_handle: TokioMutex::new(None),
            close_tx: TokioMutex::new(None),
            lifecycle_lock: TokioMutex::new(()),
        }
    }

    /// 连接成功后把地址写入本地存储的 `host` 键。
    pub fn with_storage(mut self, storage: LocalStorage) -> Self {
        self.storage = Some(Arc::new(TokioMutex::new(storage)));
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn profile(&self) -> DeviceProfile {
        self.options.profile
    }

    /// 当前状态的快照。
    pub async fn state(&self) -> SessionState {
        self.shared.state.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.shared.state.read().await.is_connected()
    }

    /// 订阅会话通知。
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// 为事件安装自定义处理函数，返回被替换的处理函数。
    pub async fn register_handler(&self, event: &str, handler: Handler) -> Result<Option<Handler>, AppError> {
        self.shared.dispatcher.write().await.register(event, handler)
    }

    /// 让轮询响应也进入分发流程 (默认被抑制)。
    pub async fn set_polling_dispatch(&self, enabled: bool) {
        self.shared.dispatcher.write().await.set_polling_suppressed(!enabled);
    }

    /// 当前等待响应的请求数。
    pub async fn pending_requests(&self) -> usize {
        self.shared.pending.len().await
    }

    pub fn url(&self) -> Result<String, AppError> {
        let url = transport::build_url(&self.options.host, self.options.port, self.options.use_tls)?;
        Ok(url.to_string())
    }

    /// 连接远程服务器。已连接时不做任何事。
    pub async fn connect(&self) -> Result<(), AppError> {
        let _lifecycle = self.lifecycle_lock.lock().await;
        if self.is_connected().await {
            info!("[会话] 已经连接，忽略重复的连接请求。");
            return Ok(());
        }

        if let Some(handle) = self.connection_task_handle.lock().await.take() {
            // 上一个连接任务正在结束
            if let Err(e) = handle.await {
                warn!("[会话] 等待上一个连接任务结束时出错: {}", e);
            }
        }

        let url = self.url()?;
        // 握手失败时状态保持 Disconnected
        let ClientConnection { ws_sender, ws_receiver } =
            transport::connect_client(url.clone(), self.options.connect_timeout).await?;

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.lock().await.set(HOST_KEY, &url) {
                warn!("[会话] 保存服务器地址失败: {}", e);
            }
        }

        *self.shared.ws_send_channel.lock().await = Some(ws_sender);
        {
            let mut state = self.shared.state.write().await;
            state.connection = ConnectionState::Connected;
            state.polling_active = true;
        }

        // 连接任务独占接收端，发送端留在共享的互斥锁中
        let (close_tx, close_rx) = oneshot::channel();
        *self.close_tx.lock().await = Some(close_tx);
        let task = tokio::spawn(self.shared.clone().run_connection(ws_receiver, close_rx, self.options.poll_interval));
        *self.connection_task_handle.lock().await = Some(task);

        if let Err(e) = self.send_command(REMOTE_DASHBOARD_SETUP, &EmptyParams {}).await {
            warn!("[会话] 发送 {} 失败: {}", REMOTE_DASHBOARD_SETUP, e);
        }

        info!("[会话] 已连接到 {}", url);
        self.shared.notify(SessionEvent::ConnectionChanged {
            connected: true,
            url: Some(url),
            reason: None,
        });
        Ok(())
    }

    /// 断开连接并等待关闭处理完成 (最多 `CLOSE_GRACE_PERIOD`)。未连接时不做任何事。
    pub async fn disconnect(&self) -> Result<(), AppError> {
        let _lifecycle = self.lifecycle_lock.lock().await;
        if !self.is_connected().await {
            info!("[会话] 未连接，忽略断开请求。");
            return Ok(());
        }
        if let Some(close_tx) = self.close_tx.lock().await.take() {
            let _ = close_tx.send(());
        }
        let handle = self.connection_task_handle.lock().await.take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(CLOSE_GRACE_PERIOD, &mut handle).await.is_err() {
                warn!("[会话] 连接任务未在 {:?} 内结束，强制中止。", CLOSE_GRACE_PERIOD);
                handle.abort();
                let _ = handle.await;
            }
        }
        // 任务被强制中止时由这里补做关闭处理；已处理过则不会重复通知
        self.shared.on_close(Some("客户端主动断开".to_string())).await;
        Ok(())
    }

    /// 发送一条命令，不等待响应。返回本次命令的 uid。
    pub async fn send_command<T: Serialize>(&self, event: &str, params: &T) -> Result<String, AppError> {
        let envelope = self.shared.prepare(event, params).await?;
        self.shared.transmit(&envelope).await?;
        info!("[会话] 已发送命令 {} (uid: {})", envelope.event, envelope.uid);
        Ok(envelope.uid)
    }

    /// 发送一条命令并等待 uid 匹配的响应。
    ///
    /// 非零状态以 `RemoteFailure` 返回；超时返回 `Timeout`；连接关闭返回 `Disconnected`。
    pub async fn request<T: Serialize>(&self, event: &str, params: &T) -> Result<Response, AppError> {
        let envelope = self.shared.prepare(event, params).await?;
        // 发送前登记，避免响应先于登记到达
        let rx = self.shared.pending.register(&envelope.uid).await;
        if let Err(e) = self.shared.transmit(&envelope).await {
            self.shared.pending.remove(&envelope.uid).await;
            return Err(e);
        }
        self.shared
            .pending
            .wait(event, &envelope.uid, rx, self.options.request_timeout)
            .await
    }
}
