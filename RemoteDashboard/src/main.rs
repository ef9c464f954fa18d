// RemoteDashboard/src/main.rs

//! 控制台的命令行入口。
//!
//! 启动后加载配置、连接远程服务器，然后从标准输入逐行读取命令：
//! - `<事件名> [JSON 参数]`: 原样发送一条命令，例如 `RemoteCoolingTo {"temperature": -10}`
//! - `:state` 打印会话状态，`:connect` / `:disconnect` 管理连接
//! - `:camera [JSON 表单]` / `:focuser [JSON 表单]` 连接设备，`:expose <JSON 表单>` 开始曝光
//! - `:quit` 断开并退出

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use app_lib::commands::camera_cmds::{self, ExposureForm, FilterWheel};
use app_lib::commands::{focuser_cmds, ConnectForm};
use app_lib::config::{self, AppConfig, LocalStorage};
use app_lib::event::{self, SessionEvent};
use app_lib::{RemoteSession, SessionOptions};
use log::{error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let app_config = AppConfig::load_or_create(&config_path);

    env_logger::Builder::new()
        .filter_level(app_config.log_level_filter())
        .format_timestamp_millis()
        .init();
    info!("[主程序] 日志系统已初始化，级别: {}", app_config.log_level_filter());
    info!("[主程序] 配置文件: {:?}", config_path);

    let storage = LocalStorage::open(config::default_storage_path());
    if let Some(last_host) = storage.get(config::HOST_KEY) {
        info!("[主程序] 上次连接的服务器: {}", last_host);
    }

    let session = Arc::new(RemoteSession::new(SessionOptions::from(&app_config)).with_storage(storage));
    tokio::spawn(event::forward_notifications(session.subscribe(), |notification| {
        match notification {
            SessionEvent::Polled => {}
            other => info!("[界面通知] {}", serde_json::to_string(&other).unwrap_or_default()),
        }
    }));

    if let Err(e) = session.connect().await {
        error!("[主程序] 连接远程服务器失败: {}", e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":quit" {
            break;
        }
        if let Err(e) = run_line(&session, line).await {
            warn!("[主程序] 命令执行失败: {}", e);
        }
    }

    session.disconnect().await?;
    info!("[主程序] 已退出。");
    Ok(())
}

async fn run_line(session: &RemoteSession, line: &str) -> Result<()> {
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let json = || -> Result<Value> {
        if rest.is_empty() {
            Ok(Value::Object(Default::default()))
        } else {
            serde_json::from_str(rest).with_context(|| format!("无法解析 JSON 参数: {}", rest))
        }
    };

    match head {
        ":state" => println!("{}", serde_json::to_string_pretty(&session.state().await)?),
        ":connect" => session.connect().await?,
        ":disconnect" => session.disconnect().await?,
        ":camera" => {
            let form: ConnectForm = serde_json::from_value(json()?)?;
            camera_cmds::camera_connect(session, form).await?;
        }
        ":focuser" => {
            let form: ConnectForm = serde_json::from_value(json()?)?;
            focuser_cmds::focuser_connect(session, form).await?;
        }
        ":expose" => {
            let form: ExposureForm = serde_json::from_value(json()?)?;
            camera_cmds::camera_start_exposure(session, &form, &FilterWheel::default()).await?;
        }
        event => {
            let uid = session.send_command(event, &json()?).await?;
            info!("[主程序] 已发送 {} (uid: {})", event, uid);
        }
    }
    Ok(())
}
