// rust_websocket_utils/src/server/transport.rs

//! 服务器端传输层：监听 TCP 连接、完成 WebSocket 握手，并把每个连接交给回调处理。

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::error::WsError;
use crate::message::Envelope;

pub type WsStream = WebSocketStream<TcpStream>;

pub struct ServerTransport;

impl ServerTransport {
    /// 绑定 `addr` 并开始接受连接。只有绑定失败时才返回。
    pub async fn start<F, Fut>(addr: SocketAddr, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&addr).await?;
        Self::serve(listener, on_connect).await
    }

    /// 在一个已绑定的监听器上接受连接。
    ///
    /// 测试可以先绑定 `127.0.0.1:0` 取得实际端口，再把监听器交给这里。
    /// 每个连接在独立任务中完成握手并执行 `on_connect`。
    pub async fn serve<F, Fut>(listener: TcpListener, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("WebSocket 服务器正在监听地址: {}", listener.local_addr()?);
        loop {
            match listener.accept().await {
                Ok((tcp_stream, peer_addr)) => {
                    debug!("从 {} 接受了新的 TCP 连接", peer_addr);
                    let on_connect_callback = on_connect.clone();
                    tokio::spawn(async move {
                        match accept_async(tcp_stream).await {
                            Ok(ws_stream) => {
                                info!("与 {} 的 WebSocket 握手成功", peer_addr);
                                on_connect_callback(ws_stream, peer_addr).await;
                            }
                            Err(e) => {
                                error!("与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("接受 TCP 连接失败: {}。服务器将继续运行。", e);
                }
            }
        }
    }
}

/// 读取下一条客户端命令。
///
/// 收到 Close 帧后继续读取，以便底层库回送关闭确认；流结束时返回 `None`。
pub async fn receive_envelope(ws: &mut WsStream) -> Option<Result<Envelope, WsError>> {
    loop {
        match ws.next().await? {
            Ok(Message::Text(text)) => {
                break Some(
                    serde_json::from_str::<Envelope>(text.trim_end())
                        .map_err(|e| WsError::DecodeError(format!("命令帧解析失败: {}", e))),
                );
            }
            Ok(Message::Close(frame)) => {
                debug!("服务端：收到 Close 帧: {:?}", frame);
            }
            Ok(other) => {
                debug!("服务端：忽略非文本消息: {:?}", other);
            }
            Err(e) => {
                warn!("服务端：连接结束: {}", e);
                break None;
            }
        }
    }
}

/// 向客户端发送一条文本帧。
pub async fn send_text(ws: &mut WsStream, text: String) -> Result<(), WsError> {
    ws.send(Message::Text(text)).await?;
    Ok(())
}
