//! 通用枚举模块。
//!
//! 本模块定义了控制台与远程设备服务器之间共享的枚举类型：
//! 设备配置档 (`DeviceProfile`) 决定一个会话可以使用哪一组事件词汇，
//! 设备驱动类型 (`DeviceType`) 出现在 `RemoteConnect` 的参数中。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ws_payloads::{BASIC_DEVICE_EVENT_COUNT, CAMERA_EVENTS};

/// 会话所控制的远程设备种类。
///
/// 每种配置档对应一张固定的事件注册表：相机拥有完整的 25 个事件，
/// 调焦器和赤道仪只使用前 10 个 (服务器生命周期、连接管理与轮询)。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    #[default]
    Camera,
    Focuser,
    Mount,
}

impl DeviceProfile {
    /// 返回该配置档的有序事件词汇表。
    pub fn events(&self) -> &'static [&'static str] {
        match self {
            DeviceProfile::Camera => &CAMERA_EVENTS,
            DeviceProfile::Focuser | DeviceProfile::Mount => &CAMERA_EVENTS[..BASIC_DEVICE_EVENT_COUNT],
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 远程服务器用来访问设备的驱动类型。线格式为小写字符串。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ascom,
    Indi,
    Zwoasi,
    Qhyccd,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Ascom => "ascom",
            DeviceType::Indi => "indi",
            DeviceType::Zwoasi => "zwoasi",
            DeviceType::Qhyccd => "qhyccd",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_payloads::{REMOTE_COOLING, REMOTE_POLLING, REMOTE_START_SERVER};

    #[test]
    /// 相机配置档包含完整的词汇表，调焦器与赤道仪只包含前缀。
    fn test_profile_event_tables() {
        assert_eq!(DeviceProfile::Camera.events().len(), 25);
        assert_eq!(DeviceProfile::Focuser.events().len(), 10);
        assert_eq!(DeviceProfile::Mount.events().len(), 10);

        assert_eq!(DeviceProfile::Mount.events()[0], REMOTE_START_SERVER);
        assert!(DeviceProfile::Focuser.events().contains(&REMOTE_POLLING));
        assert!(!DeviceProfile::Focuser.events().contains(&REMOTE_COOLING), "调焦器不应拥有制冷事件");
    }

    #[test]
    fn test_profile_default_and_display() {
        assert_eq!(DeviceProfile::default(), DeviceProfile::Camera);
        assert_eq!(DeviceProfile::Mount.to_string(), "Mount");
    }

    #[test]
    /// 配置文件中的配置档使用小写名称。
    fn test_profile_serde_lowercase() {
        let json = serde_json::to_string(&DeviceProfile::Focuser).expect("序列化失败");
        assert_eq!(json, "\"focuser\"");
        let parsed: DeviceProfile = serde_json::from_str("\"mount\"").expect("反序列化失败");
        assert_eq!(parsed, DeviceProfile::Mount);
        assert!(serde_json::from_str::<DeviceProfile>("\"telescope\"").is_err());
    }

    #[test]
    fn test_device_type_display_matches_wire_name() {
        for device_type in [DeviceType::Ascom, DeviceType::Indi, DeviceType::Zwoasi, DeviceType::Qhyccd] {
            let wire = serde_json::to_value(device_type).expect("序列化失败");
            assert_eq!(wire, serde_json::Value::String(device_type.to_string()));
        }
    }
}
