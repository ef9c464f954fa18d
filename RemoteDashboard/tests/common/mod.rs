// RemoteDashboard/tests/common/mod.rs

//! 集成测试使用的模拟远程设备服务器。

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_lib::{RemoteSession, SessionOptions};
use common_models::enums::DeviceProfile;
use futures_util::StreamExt;
use rust_websocket_utils::message::Envelope;
use rust_websocket_utils::server::transport::{receive_envelope, send_text, ServerTransport, WsStream};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const MOCK_VERSION: &str = "1.0.0";
/// 模拟服务器对该事件不作任何回应。
pub const SILENT_EVENT: &str = "RemoteGetCoolingStatus";
/// 模拟服务器对该事件回应失败状态。
pub const FAILING_EVENT: &str = "RemoteDisconnect";
pub const FAILURE_MESSAGE: &str = "device busy";
/// 模拟服务器先回送一帧无法解析的文本，再回送一条带新版本号的初始化响应，最后正常应答。
pub const GARBLED_EVENT: &str = "RemoteGetConfiguration";
pub const GARBLED_FRAME: &str = "{not json NaN";
pub const GARBLED_VERSION: &str = "9";

pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct MockServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Envelope>>>,
    connections: Arc<AtomicUsize>,
    kick_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), rust_websocket_utils::WsError>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
        let addr = listener.local_addr().expect("无法获取本地监听地址");
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let (kick_tx, kick_rx) = watch::channel(false);

        let on_connect = {
            let received = received.clone();
            let connections = connections.clone();
            move |ws: WsStream, _peer: SocketAddr| {
                connections.fetch_add(1, Ordering::SeqCst);
                serve_connection(ws, received.clone(), kick_rx.clone())
            }
        };
        let handle = tokio::spawn(ServerTransport::serve(listener, on_connect));
        Self { addr, received, connections, kick_tx, handle }
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            host: "127.0.0.1".to_string(),
            port: self.addr.port(),
            use_tls: false,
            profile: DeviceProfile::Camera,
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
        }
    }

    pub fn session(&self) -> RemoteSession {
        RemoteSession::new(self.options())
    }

    pub fn events(&self) -> Vec<String> {
        self.received.lock().expect("锁中毒").iter().map(|e| e.event.clone()).collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.received.lock().expect("锁中毒").clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// 服务器主动关闭所有连接。
    pub fn kick_all(&self) {
        let _ = self.kick_tx.send(true);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn reply_for(envelope: &Envelope) -> Option<Value> {
    let event = envelope.event.as_str();
    let reply = match event {
        SILENT_EVENT => return None,
        // 与真实服务器一致：初始化响应不带 uid
        "RemoteDashboardSetup" => json!({
            "event": event, "status": 0, "message": "", "params": { "version": MOCK_VERSION }
        }),
        "RemoteConnect" | "RemotePolling" => json!({
            "event": event, "uid": envelope.uid, "status": 0, "message": "",
            "params": { "info": {
                "name": "MockCam", "type": "ascom",
                "network": { "ipaddress": "127.0.0.1", "api_version": "1" },
                "current": { "exposure": 1.5, "temperature": null },
                "ability": { "can_cooling": true }
            } }
        }),
        FAILING_EVENT => json!({
            "event": event, "uid": envelope.uid, "status": 1, "message": FAILURE_MESSAGE, "params": {}
        }),
        _ => json!({
            "event": event, "uid": envelope.uid, "status": 0, "message": "", "params": envelope.params
        }),
    };
    Some(reply)
}

fn frames_before_reply(envelope: &Envelope) -> Vec<String> {
    if envelope.event != GARBLED_EVENT {
        return Vec::new();
    }
    let setup = json!({
        "event": "RemoteDashboardSetup", "status": 0, "message": "", "params": { "version": GARBLED_VERSION }
    });
    vec![GARBLED_FRAME.to_string(), setup.to_string()]
}

async fn serve_connection(mut ws: WsStream, received: Arc<Mutex<Vec<Envelope>>>, mut kick_rx: watch::Receiver<bool>) {
    loop {
        if *kick_rx.borrow() {
            break;
        }
        tokio::select! {
            incoming = receive_envelope(&mut ws) => match incoming {
                Some(Ok(envelope)) => {
                    for frame in frames_before_reply(&envelope) {
                        if send_text(&mut ws, frame).await.is_err() {
                            return;
                        }
                    }
                    let reply = reply_for(&envelope);
                    received.lock().expect("锁中毒").push(envelope);
                    if let Some(reply) = reply {
                        // 模拟服务器的 NaN 读数
                        let text = reply.to_string().replace("\"temperature\":null", "\"temperature\":NaN");
                        if send_text(&mut ws, text).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Err(_)) => continue,
                None => return,
            },
            changed = kick_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
    let _ = ws.close(None).await;
    while let Some(Ok(_)) = ws.next().await {}
}

/// 在 `timeout` 内反复检查会话状态，直到满足条件。
pub async fn eventually<F>(session: &RemoteSession, timeout: Duration, mut predicate: F) -> bool
where
    F: FnMut(&app_lib::state::SessionState) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate(&session.state().await) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
