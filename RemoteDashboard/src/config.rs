// RemoteDashboard/src/config.rs

//! 应用配置与本地存储。
//!
//! - `AppConfig`: JSON 配置文件，首次运行或文件损坏时以默认值重建。
//! - `LocalStorage`: 简单的键值 JSON 文件，保存上次成功连接的服务器地址 (键 `host`)。

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common_models::enums::DeviceProfile;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const CONFIG_FILE_NAME: &str = "dashboard_settings.json";
pub const STORAGE_FILE_NAME: &str = "dashboard_storage.json";
/// 本地存储中保存服务器地址的键。
pub const HOST_KEY: &str = "host";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// 控制台的主配置。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// 远程服务器主机名或 IP。
    pub host: String,
    pub port: u16,
    /// 为真时使用 `wss://`，否则 `ws://`。
    pub use_tls: bool,
    /// 会话所控制的设备种类，决定可用的事件注册表。
    pub device_profile: DeviceProfile,
    /// 轮询间隔 (毫秒)。
    pub poll_interval_ms: u64,
    /// `request` 等待响应的超时 (毫秒)。
    pub request_timeout_ms: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            use_tls: false,
            device_profile: DeviceProfile::Camera,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从 `path` 加载配置。文件缺失或无法解析时使用默认配置并尝试写回。
    pub fn load_or_create(path: &Path) -> AppConfig {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => {
                    info!("[配置模块] 已从 {:?} 加载应用配置。", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "[配置模块] 从 {:?} 解析配置失败: {}。文件可能已损坏，将使用默认配置并覆盖。",
                        path, e
                    );
                    Self::create_default(path)
                }
            },
            Err(e) => {
                info!("[配置模块] 未能读取 {:?} ({})，将创建默认配置。", path, e);
                Self::create_default(path)
            }
        }
    }

    fn create_default(path: &Path) -> AppConfig {
        let config = AppConfig::default();
        if let Err(e) = config.save(path) {
            warn!("[配置模块] 保存默认配置失败: {}", e);
        }
        config
    }

    /// 以美化的 JSON 写入 `path`，必要时创建父目录。
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        write_json(path, self)?;
        info!("[配置模块] 配置已保存到 {:?}。", path);
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 日志级别；无法识别的值回退为 `Info`。
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
    }
}

/// 配置文件路径：当前目录可写时放在当前目录，否则放到用户目录下。
pub fn default_config_path() -> PathBuf {
    resolve_data_file(CONFIG_FILE_NAME)
}

pub fn default_storage_path() -> PathBuf {
    resolve_data_file(STORAGE_FILE_NAME)
}

fn resolve_data_file(file_name: &str) -> PathBuf {
    let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidate = current_dir.join(file_name);
    let dir_writable = fs::metadata(&current_dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false);
    if candidate.exists() || dir_writable {
        return candidate;
    }
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home).join(".config").join("remote_dashboard").join(file_name);
    }
    if let Ok(profile) = env::var("USERPROFILE") {
        return PathBuf::from(profile)
            .join("AppData")
            .join("Local")
            .join("remote_dashboard")
            .join(file_name);
    }
    candidate
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("创建目录 {:?} 失败: {}", parent, e)))?;
        }
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Config(format!("序列化失败: {}", e)))?;
    fs::write(path, content).map_err(|e| AppError::Config(format!("写入 {:?} 失败: {}", path, e)))
}

/// 持久化的键值存储，每次写入都会落盘。
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// 打开 `path` 处的存储。文件缺失时为空；文件损坏时记录警告并从空存储开始。
    pub fn open(path: impl Into<PathBuf>) -> LocalStorage {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("[本地存储] {:?} 内容无法解析 ({})，将从空存储开始。", path, e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        LocalStorage { path, entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        write_json(&self.path, &self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
