// RemoteDashboard/src/event.rs

//! 会话向界面协作方发出的通知。
//!
//! 界面通过 `RemoteSession::subscribe()` 取得一个广播接收端，据此刷新显示。
//! 通知只携带渲染所需的状态，不要求界面回应。

use log::warn;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::state::SessionState;

/// 广播通道容量。落后过多的订阅者会丢失最旧的通知。
pub const SESSION_EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 与远程服务器的连接建立或断开。
    ConnectionChanged {
        connected: bool,
        url: Option<String>,
        reason: Option<String>,
    },
    /// 某个响应处理器更新了会话状态。
    StateChanged { event: String, state: SessionState },
    /// 服务器以非零状态回应了一条命令。
    RemoteFailure { event: String, status: i64, message: String },
    /// 收到一次轮询响应。
    Polled,
}

/// 持续读取通知并交给 `sink`，直到会话被销毁 (通道关闭)。
///
/// 订阅者落后时跳过丢失的通知继续读取。返回累计跳过的通知数。
pub async fn forward_notifications<F>(mut receiver: broadcast::Receiver<SessionEvent>, mut sink: F) -> u64
where
    F: FnMut(SessionEvent),
{
    let mut skipped_total = 0;
    loop {
        match receiver.recv().await {
            Ok(event) => sink(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("[界面通知] 订阅者处理过慢，跳过了 {} 条通知。", skipped);
                skipped_total += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    skipped_total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_survives_lagging_and_stops_on_close() {
        let (tx, rx) = broadcast::channel(2);
        for _ in 0..5 {
            tx.send(SessionEvent::Polled).expect("发送通知失败");
        }
        tx.send(SessionEvent::ConnectionChanged { connected: false, url: None, reason: None })
            .expect("发送通知失败");
        drop(tx);

        let mut seen = Vec::new();
        let skipped = forward_notifications(rx, |event| seen.push(event)).await;

        assert_eq!(skipped, 4);
        assert_eq!(seen.len(), 2, "落后之后仍应收到最新的通知");
        assert!(matches!(seen.last(), Some(SessionEvent::ConnectionChanged { connected: false, .. })));
    }
}
