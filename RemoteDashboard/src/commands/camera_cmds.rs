// RemoteDashboard/src/commands/camera_cmds.rs

//! 相机命令：连接、单次曝光、序列曝光与制冷。

use common_models::ws_payloads::{
    CoolingParams, CoolingToParams, EmptyParams, ExposureParams, SequenceExposureParams,
    REMOTE_ABORT_EXPOSURE, REMOTE_ABORT_SEQUENCE_EXPOSURE, REMOTE_CONNECT, REMOTE_CONTINUE_SEQUENCE_EXPOSURE,
    REMOTE_COOLING, REMOTE_COOLING_TO, REMOTE_GET_COOLING_STATUS, REMOTE_GET_EXPOSURE_RESULT,
    REMOTE_GET_EXPOSURE_STATUS, REMOTE_GET_SEQUENCE_EXPOSURE_RESULTS, REMOTE_GET_SEQUENCE_EXPOSURE_STATUS,
    REMOTE_PAUSE_SEQUENCE_EXPOSURE, REMOTE_START_EXPOSURE, REMOTE_START_SEQUENCE_EXPOSURE,
};
use log::{info, warn};
use serde::Deserialize;

use crate::commands::ConnectForm;
use crate::error::AppError;
use crate::ws_client::RemoteSession;

pub const DEFAULT_CAMERA_NAME: &str = "camera";

pub const MAX_EXPOSURE_SECONDS: f64 = 3600.0;
pub const MAX_GAIN: u32 = 100;
pub const MAX_OFFSET: u32 = 100;
pub const MIN_BINNING: u8 = 1;
pub const MAX_BINNING: u8 = 8;

/// 滤镜轮的连接状态与可用滤镜。
#[derive(Debug, Clone, Default)]
pub struct FilterWheel {
    pub connected: bool,
    pub filters: Vec<String>,
}

/// 单次曝光表单。
#[derive(Debug, Clone, Deserialize)]
pub struct ExposureForm {
    pub exposure: f64,
    #[serde(default)]
    pub gain: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub filter: Option<String>,
    /// 缺省为 1。
    #[serde(default)]
    pub binning: Option<u8>,
}

impl ExposureForm {
    /// 校验表单并生成曝光参数。
    pub fn validate(&self, filter_wheel: &FilterWheel) -> Result<ExposureParams, AppError> {
        if !self.exposure.is_finite() || !(0.0..=MAX_EXPOSURE_SECONDS).contains(&self.exposure) {
            return Err(AppError::InvalidInput(format!(
                "曝光时长 {} 超出范围 0..={}",
                self.exposure, MAX_EXPOSURE_SECONDS
            )));
        }
        if self.gain > MAX_GAIN {
            return Err(AppError::InvalidInput(format!("增益 {} 超出范围 0..={}", self.gain, MAX_GAIN)));
        }
        if self.offset > MAX_OFFSET {
            return Err(AppError::InvalidInput(format!("偏置 {} 超出范围 0..={}", self.offset, MAX_OFFSET)));
        }
        if let Some(filter) = &self.filter {
            if !filter_wheel.connected {
                return Err(AppError::InvalidInput("滤镜轮未连接，不能指定滤镜".to_string()));
            }
            if !filter_wheel.filters.iter().any(|f| f == filter) {
                return Err(AppError::InvalidInput(format!("未知的滤镜 '{}'", filter)));
            }
        }
        let binning = self.binning.unwrap_or(MIN_BINNING);
        if !(MIN_BINNING..=MAX_BINNING).contains(&binning) {
            return Err(AppError::InvalidInput(format!(
                "像素合并 {} 超出范围 {}..={}",
                binning, MIN_BINNING, MAX_BINNING
            )));
        }
        Ok(ExposureParams {
            exposure: self.exposure,
            gain: self.gain,
            offset: self.offset,
            filter: self.filter.clone(),
            binning,
        })
    }
}

/// 请求远程服务器连接相机。
pub async fn camera_connect(session: &RemoteSession, form: ConnectForm) -> Result<String, AppError> {
    let params = form.into_params(DEFAULT_CAMERA_NAME);
    info!(
        "[相机命令] 尝试连接相机 {}:{} ({}, {})",
        params.host, params.port, params.name, params.device_type
    );
    session.send_command(REMOTE_CONNECT, &params).await
}

/// 开始单次曝光。已有曝光或序列在进行时拒绝。
pub async fn camera_start_exposure(
    session: &RemoteSession,
    form: &ExposureForm,
    filter_wheel: &FilterWheel,
) -> Result<String, AppError> {
    if session.state().await.is_busy() {
        warn!("[相机命令] 曝光已在进行中。");
        return Err(AppError::InvalidInput("曝光已在进行中".to_string()));
    }
    let params = form.validate(filter_wheel)?;
    session.send_command(REMOTE_START_EXPOSURE, &params).await
}

/// 中止当前曝光。没有曝光在进行时拒绝。
pub async fn camera_abort_exposure(session: &RemoteSession) -> Result<String, AppError> {
    if !session.state().await.exposure_in_progress {
        warn!("[相机命令] 当前没有曝光进程。");
        return Err(AppError::InvalidInput("当前没有曝光进程".to_string()));
    }
    session.send_command(REMOTE_ABORT_EXPOSURE, &EmptyParams {}).await
}

pub async fn camera_get_exposure_status(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_EXPOSURE_STATUS, &EmptyParams {}).await
}

pub async fn camera_get_exposure_result(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_EXPOSURE_RESULT, &EmptyParams {}).await
}

pub async fn camera_start_sequence(
    session: &RemoteSession,
    params: &SequenceExposureParams,
) -> Result<String, AppError> {
    if params.sequence.is_empty() {
        return Err(AppError::InvalidInput("序列为空".to_string()));
    }
    session.send_command(REMOTE_START_SEQUENCE_EXPOSURE, params).await
}

pub async fn camera_abort_sequence(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_ABORT_SEQUENCE_EXPOSURE, &EmptyParams {}).await
}

pub async fn camera_pause_sequence(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_PAUSE_SEQUENCE_EXPOSURE, &EmptyParams {}).await
}

pub async fn camera_continue_sequence(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_CONTINUE_SEQUENCE_EXPOSURE, &EmptyParams {}).await
}

pub async fn camera_get_sequence_status(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_SEQUENCE_EXPOSURE_STATUS, &EmptyParams {}).await
}

pub async fn camera_get_sequence_results(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_SEQUENCE_EXPOSURE_RESULTS, &EmptyParams {}).await
}

/// 开启或关闭制冷。
pub async fn camera_cooling(session: &RemoteSession, enable: bool) -> Result<String, AppError> {
    session.send_command(REMOTE_COOLING, &CoolingParams { enable }).await
}

/// 制冷到目标温度 (摄氏度)。
pub async fn camera_cooling_to(session: &RemoteSession, temperature: f64) -> Result<String, AppError> {
    if !temperature.is_finite() {
        return Err(AppError::InvalidInput(format!("无效的目标温度 {}", temperature)));
    }
    session.send_command(REMOTE_COOLING_TO, &CoolingToParams { temperature }).await
}

pub async fn camera_get_cooling_status(session: &RemoteSession) -> Result<String, AppError> {
    session.send_command(REMOTE_GET_COOLING_STATUS, &EmptyParams {}).await
}
