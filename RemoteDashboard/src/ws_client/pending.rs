// RemoteDashboard/src/ws_client/pending.rs

//! 按 uid 关联请求与响应的待决请求表。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rust_websocket_utils::message::Response;
use tokio::sync::{oneshot, Mutex as TokioMutex};

use crate::error::{AppError, RemoteFailure};

type Reply = Result<Response, AppError>;

#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    inner: Arc<TokioMutex<HashMap<String, oneshot::Sender<Reply>>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个待决请求，返回用于等待响应的接收端。
    pub async fn register(&self, uid: &str) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        if self.inner.lock().await.insert(uid.to_string(), tx).is_some() {
            warn!("[待决请求] uid {} 重复登记，旧的等待者将收不到响应。", uid);
        }
        rx
    }

    pub async fn remove(&self, uid: &str) {
        self.inner.lock().await.remove(uid);
    }

    /// 用响应完成对应 uid 的请求。没有匹配的等待者时返回 `false`。
    ///
    /// 非零状态的响应以 `AppError::RemoteFailure` 交付。
    pub async fn resolve(&self, response: &Response) -> bool {
        let Some(uid) = response.uid.as_deref() else {
            return false;
        };
        let Some(tx) = self.inner.lock().await.remove(uid) else {
            return false;
        };
        let reply = match RemoteFailure::from_response(response) {
            Some(failure) => Err(AppError::RemoteFailure(failure)),
            None => Ok(response.clone()),
        };
        if tx.send(reply).is_err() {
            debug!("[待决请求] uid {} 的等待者已放弃。", uid);
        }
        true
    }

    /// 以 `Disconnected` 结束所有待决请求。
    pub async fn fail_all(&self) {
        let drained: Vec<_> = self.inner.lock().await.drain().collect();
        if !drained.is_empty() {
            debug!("[待决请求] 连接关闭，{} 个请求以 Disconnected 结束。", drained.len());
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(AppError::Disconnected));
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// 在 `timeout` 内等待响应。超时后移除该条目并返回 `Timeout`。
    pub async fn wait(
        &self,
        event: &str,
        uid: &str,
        rx: oneshot::Receiver<Reply>,
        timeout: Duration,
    ) -> Result<Response, AppError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(AppError::Disconnected),
            Err(_) => {
                self.remove(uid).await;
                Err(AppError::Timeout {
                    event: event.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
