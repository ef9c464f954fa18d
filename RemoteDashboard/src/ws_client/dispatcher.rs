// RemoteDashboard/src/ws_client/dispatcher.rs

//! 响应分发器：按事件名称把解码后的响应交给对应的处理函数。

use std::collections::HashMap;

use common_models::enums::DeviceProfile;
use common_models::ws_payloads::REMOTE_POLLING;
use log::debug;
use rust_websocket_utils::message::Response;
use tokio::sync::broadcast;

use crate::error::AppError;
use crate::event::SessionEvent;
use crate::state::SessionState;
use crate::ws_client::handlers;
use crate::ws_client::registry::EventRegistry;

/// 处理函数。处理函数不返回错误：失败响应在内部记录并吸收。
pub type Handler = fn(&mut DispatchContext<'_>, &Response);

/// 处理函数可访问的会话上下文。
pub struct DispatchContext<'a> {
    pub state: &'a mut SessionState,
    events: &'a broadcast::Sender<SessionEvent>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(state: &'a mut SessionState, events: &'a broadcast::Sender<SessionEvent>) -> Self {
        Self { state, events }
    }

    /// 向界面协作方发送通知。没有订阅者时通知被丢弃。
    pub fn notify(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// 发送携带当前状态快照的 `StateChanged` 通知。
    pub fn notify_state(&self, event: &str) {
        self.notify(SessionEvent::StateChanged {
            event: event.to_string(),
            state: self.state.clone(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 轮询响应，不进入处理流程。
    Suppressed,
    /// 已交给该事件的处理函数。
    Handled(&'static str),
    /// 事件名称不在注册表中，静默忽略。
    Unroutable,
    /// 事件已注册但没有处理函数。
    NoHandler,
}

pub struct Dispatcher {
    registry: EventRegistry,
    handlers: HashMap<&'static str, Handler>,
    suppress_polling: bool,
}

impl Dispatcher {
    /// 创建一个没有任何处理函数的分发器。
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            registry: EventRegistry::new(profile),
            handlers: HashMap::new(),
            suppress_polling: true,
        }
    }

    /// 创建分发器并安装默认处理表中属于该配置档的条目。
    pub fn with_default_handlers(profile: DeviceProfile) -> Self {
        let mut dispatcher = Self::new(profile);
        for (event, handler) in handlers::default_table() {
            if dispatcher.registry.contains(event) {
                dispatcher.handlers.insert(event, handler);
            }
        }
        dispatcher
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// 为事件安装处理函数，返回被替换的旧处理函数。未注册的事件返回 `UnknownEvent`。
    pub fn register(&mut self, event: &str, handler: Handler) -> Result<Option<Handler>, AppError> {
        let name = self
            .registry
            .classify(event)
            .and_then(|index| self.registry.name(index))
            .ok_or_else(|| AppError::UnknownEvent {
                event: event.to_string(),
                profile: self.registry.profile(),
            })?;
        Ok(self.handlers.insert(name, handler))
    }

    pub fn unregister(&mut self, event: &str) -> Option<Handler> {
        self.handlers.remove(event)
    }

    pub fn has_handler(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// 轮询响应默认不分发；关闭抑制后它们会交给 `RemotePolling` 的处理函数。
    pub fn set_polling_suppressed(&mut self, suppressed: bool) {
        self.suppress_polling = suppressed;
    }

    pub fn dispatch(&self, ctx: &mut DispatchContext<'_>, response: &Response) -> DispatchOutcome {
        if self.suppress_polling && response.event == REMOTE_POLLING {
            return DispatchOutcome::Suppressed;
        }
        let Some(name) = self
            .registry
            .classify(&response.event)
            .and_then(|index| self.registry.name(index))
        else {
            debug!("[分发器] 忽略未注册的事件 '{}'", response.event);
            return DispatchOutcome::Unroutable;
        };
        match self.handlers.get(name) {
            Some(handler) => {
                handler(ctx, response);
                DispatchOutcome::Handled(name)
            }
            None => {
                debug!("[分发器] 事件 '{}' 没有处理函数", name);
                DispatchOutcome::NoHandler
            }
        }
    }
}
