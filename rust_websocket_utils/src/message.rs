// rust_websocket_utils/src/message.rs

//! 定义远程设备协议中使用的核心消息结构与编解码函数。
//!
//! - 出站方向，客户端发送 `Envelope`：`{ "event", "uid", "params" }`，序列化为 JSON 后追加 `\r\n`。
//! - 入站方向，服务器回送 `Response`：`{ "event", "uid"?, "status", "message"?, "params"? }`。
//!   服务器可能在数值位置写出非标准 JSON 的 `NaN` 字面量，解码前会先替换为 `null`。

use std::borrow::Cow;
use std::sync::LazyLock;

use log::error;
use rand::Rng;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::WsError;

/// 每个出站帧末尾追加的行终止符。
pub const FRAME_TERMINATOR: &str = "\r\n";

/// 成功状态码。其余任何状态码都表示失败。
pub const STATUS_SUCCESS: i64 = 0;
/// 服务器以字符串 `"error"` 上报的失败。
pub const STATUS_ERROR: i64 = 1;
/// 服务器以字符串 `"warning"` 上报的失败，通常可以重试。
pub const STATUS_WARNING: i64 = 2;
/// 响应中缺少状态或状态无法识别。
pub const STATUS_UNKNOWN: i64 = -1;

// 只匹配独立的 NaN 记号 (ASCII 单词边界)，不会改写 "NaNa" 或 "xNaN" 这类片段。
static NAN_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?-u:\b)NaN(?-u:\b)").ok());

/// 生成一个请求标识符：32 个大写十六进制数字，按 8-4-4-4-12 分组并以连字符连接。
///
/// 随机生成，不保证全局唯一。
pub fn generate_uid() -> String {
    let bits: u128 = rand::thread_rng().r#gen();
    let mut buffer = Uuid::encode_buffer();
    Uuid::from_u128(bits).hyphenated().encode_upper(&mut buffer).to_string()
}

/// 将原始文本中每个独立的 `NaN` 记号替换为 `null`。没有匹配时不会分配新字符串。
pub fn sanitize_nan(raw: &str) -> Cow<'_, str> {
    match NAN_TOKEN.as_ref() {
        Some(re) => re.replace_all(raw, "null"),
        None => {
            error!("NaN 替换正则未能初始化，按原文解码。");
            Cow::Borrowed(raw)
        }
    }
}

/// 出站命令信封。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    /// 事件名称，必须属于会话所用配置档的事件注册表。
    pub event: String,
    /// 本次请求的标识符，由 `generate_uid` 生成。
    pub uid: String,
    /// 命令参数。没有参数时序列化为 `{}`。
    pub params: Value,
}

impl Envelope {
    /// 以新生成的 uid 构建信封。
    ///
    /// `params` 序列化为 `null` (例如 `()`) 时按空对象处理。
    pub fn new<T: Serialize>(event: impl Into<String>, params: &T) -> Result<Self, WsError> {
        let params = match serde_json::to_value(params) {
            Ok(Value::Null) => Value::Object(Map::new()),
            Ok(value) => value,
            Err(e) => return Err(WsError::SerializationError(format!("命令参数序列化失败: {}", e))),
        };
        Ok(Envelope {
            event: event.into(),
            uid: generate_uid(),
            params,
        })
    }

    /// 序列化为线格式文本帧 (JSON + `\r\n`)。
    pub fn to_frame(&self) -> Result<String, WsError> {
        let mut frame = serde_json::to_string(self)
            .map_err(|e| WsError::SerializationError(format!("信封序列化为JSON失败: {}", e)))?;
        frame.push_str(FRAME_TERMINATOR);
        Ok(frame)
    }
}

/// 入站响应。
///
/// 未在此声明的字段 (如原始服务器附带的 `id`) 被收集在 `extras` 中。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default = "unknown_status", deserialize_with = "deserialize_status")]
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub params: Value,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// 读取 `params` 中的某个字段。`params` 缺失或不是对象时返回 `None`。
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_object().and_then(|map| map.get(key))
    }

    /// 将 `params` 反序列化为指定的类型。
    pub fn deserialize_params<T: DeserializeOwned>(&self) -> Result<T, WsError> {
        serde_json::from_value(self.params.clone()).map_err(|e| {
            WsError::DecodeError(format!("事件 '{}' 的 params 无法解析为目标类型: {}", self.event, e))
        })
    }

    /// 失败原因文本；服务器未提供时返回空串。
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

fn unknown_status() -> i64 {
    STATUS_UNKNOWN
}

/// 将字符串形式的状态映射为状态码。
pub fn status_from_str(status: &str) -> i64 {
    match status.trim().to_ascii_lowercase().as_str() {
        "success" | "ok" => STATUS_SUCCESS,
        "error" => STATUS_ERROR,
        "warning" => STATUS_WARNING,
        other => other.parse::<i64>().unwrap_or(STATUS_UNKNOWN),
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            // 只接受没有小数部分的浮点状态码 (如 `0.0`)，`0.5` 不能算作成功
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(STATUS_UNKNOWN),
        Value::String(s) => status_from_str(&s),
        _ => STATUS_UNKNOWN,
    })
}

/// 使用新的 uid 编码一条命令，返回可直接发送的文本帧。
pub fn encode<T: Serialize>(event: &str, params: &T) -> Result<String, WsError> {
    Envelope::new(event, params)?.to_frame()
}

/// 解码一条入站文本帧。
pub fn decode(raw: &str) -> Result<Response, WsError> {
    let sanitized = sanitize_nan(raw.trim_end());
    serde_json::from_str::<Response>(&sanitized)
        .map_err(|e| WsError::DecodeError(format!("入站帧解析失败: {}, 原始文本: '{}'", e, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_models::ws_payloads::{CoolingToParams, EmptyParams, REMOTE_COOLING_TO, REMOTE_DASHBOARD_SETUP};
    use serde_json::json;

    fn is_uid_shape(uid: &str) -> bool {
        let groups: Vec<&str> = uid.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        lengths == [8, 4, 4, 4, 12]
            && groups
                .iter()
                .all(|g| g.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)))
    }

    #[test]
    fn test_generate_uid_shape() {
        for _ in 0..64 {
            let uid = generate_uid();
            assert!(is_uid_shape(&uid), "uid 格式不符合 8-4-4-4-12 大写十六进制: {}", uid);
        }
        assert_ne!(generate_uid(), generate_uid(), "连续生成的两个 uid 不应相同");
    }

    #[test]
    /// 编码后的帧以 \r\n 结尾，解码可以还原事件名、uid 与参数。
    fn test_encode_then_decode_recovers_envelope() {
        let params = CoolingToParams { temperature: -10.5 };
        let frame = encode(REMOTE_COOLING_TO, &params).expect("编码失败");
        assert!(frame.ends_with("\r\n"));

        let raw: Value = serde_json::from_str(frame.trim_end()).expect("帧应为合法 JSON");
        let sent_uid = raw["uid"].as_str().expect("帧中应有 uid").to_string();

        let decoded = decode(&frame).expect("解码失败");
        assert_eq!(decoded.event, REMOTE_COOLING_TO);
        assert_eq!(decoded.uid.as_deref(), Some(sent_uid.as_str()));
        assert_eq!(decoded.params, json!({ "temperature": -10.5 }));
        assert_eq!(decoded.status, STATUS_UNKNOWN, "信封没有 status 字段");
    }

    #[test]
    fn test_empty_params_encode_as_object() {
        let envelope = Envelope::new(REMOTE_DASHBOARD_SETUP, &()).expect("构建信封失败");
        assert_eq!(envelope.params, json!({}));
        let envelope = Envelope::new(REMOTE_DASHBOARD_SETUP, &EmptyParams {}).expect("构建信封失败");
        let frame = envelope.to_frame().expect("序列化失败");
        assert!(frame.contains(r#""params":{}"#), "空参数应序列化为 {{}}: {}", frame);
    }

    #[test]
    fn test_decode_replaces_nan_tokens() {
        let decoded = decode(r#"{"value": NaN}"#).expect("含 NaN 的帧应能解码");
        assert_eq!(decoded.extras.get("value"), Some(&Value::Null));
        assert_eq!(decoded.event, "");

        let decoded = decode(
            r#"{"event":"RemotePolling","status":0,"params":{"info":{"current":{"temperature":NaN,"gain":NaN}}}}"#,
        )
        .expect("解码失败");
        assert!(decoded.params["info"]["current"]["temperature"].is_null());
        assert!(decoded.params["info"]["current"]["gain"].is_null());
    }

    #[test]
    /// 只有独立的 NaN 记号会被替换。
    fn test_sanitize_nan_respects_word_boundaries() {
        assert_eq!(sanitize_nan("[NaN, NaN]"), "[null, null]");
        assert_eq!(sanitize_nan(r#"{"name":"NaNa"}"#), r#"{"name":"NaNa"}"#);
        assert!(matches!(sanitize_nan(r#"{"a":1}"#), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_status_variants() {
        let cases = [
            (r#"{"event":"RemoteConnect","status":0}"#, STATUS_SUCCESS),
            (r#"{"event":"RemoteConnect","status":3}"#, 3),
            (r#"{"event":"RemoteConnect","status":"success"}"#, STATUS_SUCCESS),
            (r#"{"event":"RemoteConnect","status":"error"}"#, STATUS_ERROR),
            (r#"{"event":"RemoteConnect","status":"warning"}"#, STATUS_WARNING),
            (r#"{"event":"RemoteConnect","status":"7"}"#, 7),
            (r#"{"event":"RemoteConnect","status":NaN}"#, STATUS_UNKNOWN),
            (r#"{"event":"Bogus"}"#, STATUS_UNKNOWN),
        ];
        for (raw, expected) in cases {
            let decoded = decode(raw).unwrap_or_else(|e| panic!("解码 {} 失败: {}", raw, e));
            assert_eq!(decoded.status, expected, "帧 {} 的状态码不符", raw);
        }
    }

    #[test]
    fn test_fractional_status_is_not_success() {
        let decoded = decode(r#"{"event":"RemoteCooling","status":0.5}"#).expect("解码失败");
        assert_eq!(decoded.status, STATUS_UNKNOWN);
        assert!(!decoded.is_success());

        let decoded = decode(r#"{"event":"RemoteCooling","status":2.0}"#).expect("解码失败");
        assert_eq!(decoded.status, STATUS_WARNING);
    }

    #[test]
    fn test_decode_failure_is_decode_error() {
        match decode("not json at all") {
            Err(WsError::DecodeError(details)) => assert!(details.contains("not json")),
            other => panic!("预期 DecodeError，实际为: {:?}", other),
        }
    }

    #[test]
    fn test_response_accessors() {
        let decoded = decode(
            r#"{"event":"RemoteDashboardSetup","status":0,"message":"ok","params":{"version":"1.0.2"},"id":4}"#,
        )
        .expect("解码失败");
        assert!(decoded.is_success());
        assert_eq!(decoded.message_text(), "ok");
        assert_eq!(decoded.param("version"), Some(&json!("1.0.2")));
        assert_eq!(decoded.param("missing"), None);
        assert_eq!(decoded.extras.get("id"), Some(&json!(4)));

        #[derive(Deserialize)]
        struct Setup {
            version: String,
        }
        let setup: Setup = decoded.deserialize_params().expect("params 应能解析");
        assert_eq!(setup.version, "1.0.2");
        assert!(decoded.deserialize_params::<Vec<u8>>().is_err());
    }
}
