// rust_websocket_utils/src/client/transport.rs

//! 客户端传输层：建立连接、发送文本帧、接收并解码入站帧。

use std::time::Duration;

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::{debug, error, info};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    tungstenite::Error as TungsteniteError,
    MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::error::WsError;
use crate::message::{decode, Envelope, Response};

pub type ClientWsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
/// 连接的发送半部。会话将其放在互斥锁后面，供命令发送与轮询共享。
pub type ClientSink = SplitSink<ClientWsStream, Message>;
/// 连接的接收半部，由连接任务独占。
pub type ClientSource = SplitStream<ClientWsStream>;

/// 一个已建立的客户端连接，拆分为发送端和接收端。
pub struct ClientConnection {
    pub ws_sender: ClientSink,
    pub ws_receiver: ClientSource,
}

impl ClientConnection {
    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<(), WsError> {
        send_envelope(&mut self.ws_sender, envelope).await
    }

    /// 接收下一条已解码的响应。连接结束时返回 `None`。
    pub async fn next_response(&mut self) -> Option<Result<Response, WsError>> {
        receive_message(&mut self.ws_receiver).await
    }
}

/// 根据主机、端口与 TLS 开关构建 `ws://` 或 `wss://` 地址。
pub fn build_url(host: &str, port: u16, use_tls: bool) -> Result<Url, WsError> {
    let scheme = if use_tls { "wss" } else { "ws" };
    let raw = format!("{}://{}:{}", scheme, host.trim(), port);
    Url::parse(&raw).map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket 地址 '{}': {}", raw, e)))
}

/// 连接到远程服务器，握手必须在 `connect_timeout` 内完成。
pub async fn connect_client(url_str: String, connect_timeout: Duration) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url = Url::parse(&url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;
    if !matches!(parsed_url.scheme(), "ws" | "wss") {
        return Err(WsError::InvalidUrl(format!("不支持的协议 '{}'，仅支持 ws/wss", parsed_url.scheme())));
    }

    // 超时同时覆盖 TCP 连接与 WebSocket 握手
    match tokio::time::timeout(connect_timeout, connect_async(parsed_url.as_str())).await {
        Ok(Ok((ws_stream, response))) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            debug!("客户端：WebSocket 连接响应头: {:?}", response.headers());
            // 拆分为发送端与接收端，分别交给会话和连接任务
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Ok(Err(e)) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
        Err(_) => {
            error!("客户端：连接到 {} 超时 ({:?})", url_str, connect_timeout);
            Err(WsError::ConnectionTimeout)
        }
    }
}

/// 发送一个已经编码好的文本帧。
pub async fn send_frame(ws_sender: &mut ClientSink, frame: String) -> Result<(), WsError> {
    debug!("客户端：准备发送帧: {}", frame.trim_end());
    // 对端已关闭时归类为 SendErrorClosed
    ws_sender.send(Message::Text(frame)).await.map_err(|e| match e {
        TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => WsError::SendErrorClosed,
        other => WsError::WebSocketProtocolError(other),
    })
}

pub async fn send_envelope(ws_sender: &mut ClientSink, envelope: &Envelope) -> Result<(), WsError> {
    let frame = envelope.to_frame()?;
    send_frame(ws_sender, frame).await?;
    debug!("客户端：命令已发送 (事件: {}, uid: {})", envelope.event, envelope.uid);
    Ok(())
}

/// 发送关闭帧。对端已经关闭时视为成功。
pub async fn close(ws_sender: &mut ClientSink) -> Result<(), WsError> {
    match ws_sender.send(Message::Close(None)).await {
        Ok(()) => Ok(()),
        Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed) => Ok(()),
        Err(e) => Err(WsError::WebSocketProtocolError(e)),
    }
}

/// 从接收流读取下一条文本帧并解码为 `Response`。
///
/// 控制帧被跳过。收到 Close 帧或流结束时返回 `None`；
/// 二进制帧与解码失败以 `Some(Err(..))` 返回，调用方可记录后继续读取。
pub async fn receive_message(ws_receiver: &mut ClientSource) -> Option<Result<Response, WsError>> {
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    debug!("客户端：收到原始文本消息，内容: '{}'", text.trim_end());
                    // 解码失败交给调用方决定是否丢弃
                    break Some(decode(&text));
                }
                Message::Binary(bin) => {
                    debug!("客户端：收到二进制消息，长度: {} 字节", bin.len());
                    break Some(Err(WsError::Message("客户端收到了非预期的 WebSocket 二进制消息".to_string())));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    // 由底层库处理
                }
                Message::Close(close_frame) => {
                    debug!("客户端：收到 Close 控制帧: {:?}", close_frame);
                    break None;
                }
            },
            Some(Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed)) => {
                debug!("客户端：连接已关闭。");
                break None;
            }
            Some(Err(e)) => {
                error!("客户端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                break Some(Err(WsError::WebSocketProtocolError(e)));
            }
            None => {
                debug!("客户端：WebSocket 接收流已结束。");
                break None;
            }
        }
    }
}
