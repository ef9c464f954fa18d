// common_models/src/ws_payloads.rs

//! 远程设备协议中使用的事件名称常量及各类 Payload 结构体定义。
//!
//! 事件名称是协议的"词汇表"：客户端发出的每个命令信封 (`event` 字段) 以及服务器
//! 回送的每个响应都以这些名称之一标识。名称本身只用于分类与路由，不承载其他含义。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::DeviceType;

// --- 服务器生命周期 ---
pub const REMOTE_START_SERVER: &str = "RemoteStartServer";
pub const REMOTE_STOP_SERVER: &str = "RemoteStopServer";
pub const REMOTE_SHUTDOWN_SERVER: &str = "RemoteShutdownServer";
pub const REMOTE_RESTART_SERVER: &str = "RemoteRestartServer";

// --- 会话与设备连接 ---
/// 连接建立后客户端发送的第一条命令，服务器以版本号应答。
pub const REMOTE_DASHBOARD_SETUP: &str = "RemoteDashboardSetup";
pub const REMOTE_CONNECT: &str = "RemoteConnect";
pub const REMOTE_DISCONNECT: &str = "RemoteDisconnect";
pub const REMOTE_RECONNECT: &str = "RemoteReconnect";
pub const REMOTE_SCANNING: &str = "RemoteScanning";
/// 高频保活/状态刷新命令。其响应不进入通用分发流程。
pub const REMOTE_POLLING: &str = "RemotePolling";

// --- 单次曝光 ---
pub const REMOTE_START_EXPOSURE: &str = "RemoteStartExposure";
pub const REMOTE_ABORT_EXPOSURE: &str = "RemoteAbortExposure";
pub const REMOTE_GET_EXPOSURE_STATUS: &str = "RemoteGetExposureStatus";
pub const REMOTE_GET_EXPOSURE_RESULT: &str = "RemoteGetExposureResult";

// --- 序列曝光 ---
pub const REMOTE_START_SEQUENCE_EXPOSURE: &str = "RemoteStartSequenceExposure";
pub const REMOTE_ABORT_SEQUENCE_EXPOSURE: &str = "RemoteAbortSequenceExposure";
pub const REMOTE_PAUSE_SEQUENCE_EXPOSURE: &str = "RemotePauseSequenceExposure";
pub const REMOTE_CONTINUE_SEQUENCE_EXPOSURE: &str = "RemoteContinueSequenceExposure";
pub const REMOTE_GET_SEQUENCE_EXPOSURE_STATUS: &str = "RemoteGetSequenceExposureStatus";
pub const REMOTE_GET_SEQUENCE_EXPOSURE_RESULTS: &str = "RemoteGetSequenceExposureResults";

// --- 制冷 ---
pub const REMOTE_COOLING: &str = "RemoteCooling";
pub const REMOTE_COOLING_TO: &str = "RemoteCoolingTo";
pub const REMOTE_GET_COOLING_STATUS: &str = "RemoteGetCoolingStatus";

// --- 配置 ---
pub const REMOTE_GET_CONFIGURATION: &str = "RemoteGetConfiguration";
pub const REMOTE_SET_CONFIGURATION: &str = "RemoteSetConfiguration";

/// 相机配置档的完整事件词汇表，顺序即分类索引。
pub const CAMERA_EVENTS: [&str; 25] = [
    REMOTE_START_SERVER,
    REMOTE_STOP_SERVER,
    REMOTE_SHUTDOWN_SERVER,
    REMOTE_RESTART_SERVER,
    REMOTE_DASHBOARD_SETUP,
    REMOTE_CONNECT,
    REMOTE_DISCONNECT,
    REMOTE_RECONNECT,
    REMOTE_SCANNING,
    REMOTE_POLLING,
    REMOTE_START_EXPOSURE,
    REMOTE_ABORT_EXPOSURE,
    REMOTE_GET_EXPOSURE_STATUS,
    REMOTE_GET_EXPOSURE_RESULT,
    REMOTE_START_SEQUENCE_EXPOSURE,
    REMOTE_ABORT_SEQUENCE_EXPOSURE,
    REMOTE_PAUSE_SEQUENCE_EXPOSURE,
    REMOTE_CONTINUE_SEQUENCE_EXPOSURE,
    REMOTE_GET_SEQUENCE_EXPOSURE_STATUS,
    REMOTE_GET_SEQUENCE_EXPOSURE_RESULTS,
    REMOTE_COOLING,
    REMOTE_COOLING_TO,
    REMOTE_GET_COOLING_STATUS,
    REMOTE_GET_CONFIGURATION,
    REMOTE_SET_CONFIGURATION,
];

/// 调焦器/赤道仪配置档使用的前缀子集 (服务器生命周期、连接管理与轮询)。
pub const BASIC_DEVICE_EVENT_COUNT: usize = 10;

/// 空参数对象，序列化为 `{}`。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EmptyParams {}

/// `RemoteConnect` 命令参数：远程服务器应连接的设备位置与驱动类型。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

/// `RemoteStartExposure` 命令参数。
///
/// 字段名带下划线前缀，与远程服务器期待的键保持一致。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExposureParams {
    /// 曝光时长，单位秒。
    #[serde(rename = "_exposure")]
    pub exposure: f64,
    #[serde(rename = "_gain")]
    pub gain: u32,
    #[serde(rename = "_offset")]
    pub offset: u32,
    /// 滤镜名称；没有滤镜轮时为 `None`。
    #[serde(rename = "_filter")]
    pub filter: Option<String>,
    #[serde(rename = "_binning")]
    pub binning: u8,
}

/// `RemoteStartSequenceExposure` 命令参数。
///
/// `sequence` 中每一项的结构由服务器定义 (至少包含 `start_time`)，此处不做约束。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SequenceExposureParams {
    pub number: u32,
    pub sequence: Vec<Value>,
}

/// `RemoteCooling` 命令参数：开启或关闭制冷。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CoolingParams {
    pub enable: bool,
}

/// `RemoteCoolingTo` 命令参数：目标温度 (摄氏度)。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CoolingToParams {
    pub temperature: f64,
}

/// `RemoteDashboardSetup` 成功响应中的负载。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DashboardSetupPayload {
    #[serde(default)]
    pub version: Option<String>,
}

/// 设备的网络信息。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceNetwork {
    #[serde(default)]
    pub ipaddress: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
}

/// 设备当前的工作参数。
///
/// 服务器可能以 `NaN` 上报不可用的读数，经过解码垫片后成为 `null`，因此数值字段均为 `Option`。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceCurrent {
    #[serde(default)]
    pub exposure: Option<f64>,
    #[serde(default)]
    pub percent_complete: Option<f64>,
    #[serde(default)]
    pub binning: Option<Vec<u32>>,
    #[serde(default)]
    pub gain: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// 设备支持的能力。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceAbility {
    #[serde(default)]
    pub can_binning: bool,
    #[serde(default)]
    pub can_gain: bool,
    #[serde(default)]
    pub can_offset: bool,
    #[serde(default)]
    pub can_cooling: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceStatusFlags {
    #[serde(default)]
    pub is_cooling: bool,
}

/// `RemoteConnect` / `RemotePolling` 响应中 `params.info` 的设备描述。
///
/// 所有字段都允许缺省，未知字段被忽略，以兼容不同驱动上报的信息差异。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub network: DeviceNetwork,
    #[serde(default)]
    pub current: DeviceCurrent,
    #[serde(default)]
    pub ability: DeviceAbility,
    #[serde(default)]
    pub status: DeviceStatusFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    /// 词汇表中的事件名称必须互不相同，否则分类索引会产生歧义。
    fn test_camera_events_are_distinct() {
        let unique: HashSet<&str> = CAMERA_EVENTS.iter().copied().collect();
        assert_eq!(unique.len(), CAMERA_EVENTS.len(), "CAMERA_EVENTS 中存在重复的事件名称");
        assert_eq!(CAMERA_EVENTS[9], REMOTE_POLLING, "轮询事件应位于索引 9");
        assert_eq!(CAMERA_EVENTS[BASIC_DEVICE_EVENT_COUNT - 1], REMOTE_POLLING);
    }

    #[test]
    fn test_empty_params_serializes_to_empty_object() {
        let json = serde_json::to_string(&EmptyParams {}).expect("EmptyParams 序列化失败");
        assert_eq!(json, "{}");
    }

    #[test]
    /// 曝光参数必须使用服务器期待的下划线键名。
    fn test_exposure_params_wire_keys() {
        let params = ExposureParams {
            exposure: 30.0,
            gain: 20,
            offset: 10,
            filter: None,
            binning: 1,
        };
        let value = serde_json::to_value(&params).expect("ExposureParams 序列化失败");
        assert_eq!(value["_exposure"], 30.0);
        assert_eq!(value["_gain"], 20);
        assert_eq!(value["_offset"], 10);
        assert!(value["_filter"].is_null());
        assert_eq!(value["_binning"], 1);
    }

    #[test]
    fn test_connect_params_uses_type_key() {
        let params = ConnectParams {
            host: "127.0.0.1".to_string(),
            port: 11111,
            name: "camera".to_string(),
            device_type: DeviceType::Ascom,
        };
        let value = serde_json::to_value(&params).expect("ConnectParams 序列化失败");
        assert_eq!(value["type"], "ascom");
        assert_eq!(value["port"], 11111);
    }

    #[test]
    /// 设备信息应能从稀疏的、带有 null 读数的 JSON 中解析出来。
    fn test_device_info_tolerates_sparse_json() {
        let raw = r#"{
            "name": "ZWO ASI294MC",
            "type": "zwoasi",
            "network": { "ipaddress": "10.0.0.5" },
            "current": { "exposure": 2.5, "temperature": null, "binning": [2, 2] },
            "ability": { "can_cooling": true },
            "unexpected": 42
        }"#;
        let info: DeviceInfo = serde_json::from_str(raw).expect("DeviceInfo 解析失败");
        assert_eq!(info.name.as_deref(), Some("ZWO ASI294MC"));
        assert_eq!(info.device_type.as_deref(), Some("zwoasi"));
        assert_eq!(info.network.ipaddress.as_deref(), Some("10.0.0.5"));
        assert_eq!(info.network.api_version, None);
        assert_eq!(info.current.exposure, Some(2.5));
        assert_eq!(info.current.temperature, None);
        assert_eq!(info.current.binning, Some(vec![2, 2]));
        assert!(info.ability.can_cooling);
        assert!(!info.ability.can_gain);
        assert!(!info.status.is_cooling);
    }
}
