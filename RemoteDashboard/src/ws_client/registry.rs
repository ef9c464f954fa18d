// RemoteDashboard/src/ws_client/registry.rs

//! 事件注册表：把事件名称映射到它在配置档词汇表中的稳定索引。

use std::collections::HashMap;

use common_models::enums::DeviceProfile;

#[derive(Debug, Clone)]
pub struct EventRegistry {
    profile: DeviceProfile,
    names: &'static [&'static str],
    index: HashMap<&'static str, usize>,
}

impl EventRegistry {
    pub fn new(profile: DeviceProfile) -> Self {
        let names = profile.events();
        let index = names.iter().enumerate().map(|(i, name)| (*name, i)).collect();
        Self { profile, names, index }
    }

    /// 返回事件的分类索引；未注册的名称返回 `None`。
    pub fn classify(&self, event: &str) -> Option<usize> {
        self.index.get(event).copied()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.index.contains_key(event)
    }

    pub fn name(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }
}
