use super::{EventListener, HostApi, HostEnvironment, ListenerId, WidgetStateSetter};
use crate::types::{
    CallToolResponse, DeviceType, DisplayMode, GlobalsPatch, HostEvent, OpenAiGlobals,
};
use crate::util::lock;
use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

struct RegisteredListener {
    id: ListenerId,
    event_type: String,
    listener: EventListener,
}

#[derive(Default)]
struct HostState {
    globals: Option<Arc<OpenAiGlobals>>,
    api_attached: bool,
    setter_attached: bool,
    fail_widget_state_writes: bool,
    tool_responses: HashMap<String, CallToolResponse>,
}

#[derive(Default)]
struct Records {
    widget_state_writes: Vec<Value>,
    display_mode_requests: Vec<DisplayMode>,
    tool_calls: Vec<(String, Map<String, Value>)>,
    follow_up_messages: Vec<String>,
    opened_links: Vec<String>,
}

/// In-process host: owns a globals snapshot and a global event target, and
/// records every call the widget makes into it.
///
/// Writes through the setter are recorded as soon as the setter is called,
/// and applied (plus re-dispatched) when the returned future is polled,
/// mirroring a host that acknowledges asynchronously.
pub struct MemoryHost {
    self_ref: Weak<MemoryHost>,
    state: Mutex<HostState>,
    listeners: Mutex<Vec<RegisteredListener>>,
    records: Mutex<Records>,
    next_listener_id: AtomicU64,
}

impl MemoryHost {
    /// A host with its global object attached and the full API available.
    pub fn new(globals: OpenAiGlobals) -> Arc<Self> {
        let host = Self::detached();
        host.attach(globals);
        host
    }

    /// An environment whose host object has not been injected yet.
    pub fn detached() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| MemoryHost {
            self_ref: self_ref.clone(),
            state: Mutex::new(HostState::default()),
            listeners: Mutex::new(Vec::new()),
            records: Mutex::new(Records::default()),
            next_listener_id: AtomicU64::new(1),
        })
    }

    /// Host object present, but without `setWidgetState`.
    pub fn without_setter(globals: OpenAiGlobals) -> Arc<Self> {
        let host = Self::new(globals);
        lock(&host.state).setter_attached = false;
        host
    }

    pub fn attach(&self, globals: OpenAiGlobals) {
        let mut state = lock(&self.state);
        state.globals = Some(Arc::new(globals));
        state.api_attached = true;
        state.setter_attached = true;
    }

    /// Removes the host object. Listeners stay registered on the event target.
    pub fn detach(&self) {
        let mut state = lock(&self.state);
        state.globals = None;
        state.api_attached = false;
        state.setter_attached = false;
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.state).globals.is_some()
    }

    /// Applies `patch` to the globals and dispatches the change event.
    /// Does nothing but dispatch when the host object is detached.
    pub fn set_globals(&self, patch: GlobalsPatch) {
        {
            let mut state = lock(&self.state);
            if patch.set_widget_state {
                state.setter_attached = state.globals.is_some();
            }
            if let Some(current) = state.globals.as_mut() {
                patch.apply_to(Arc::make_mut(current));
            }
        }
        self.dispatch(&HostEvent::set_globals(patch));
    }

    /// Replaces globals without notifying anyone, like a host that mutates
    /// its object and forgets to dispatch.
    pub fn set_globals_silently(&self, patch: &GlobalsPatch) {
        let mut state = lock(&self.state);
        if let Some(current) = state.globals.as_mut() {
            patch.apply_to(Arc::make_mut(current));
        }
    }

    /// Dispatches `event` to the listeners registered for its type. Listeners
    /// removed by an earlier listener in the same dispatch are skipped.
    pub fn dispatch(&self, event: &HostEvent) {
        let targets: Vec<(ListenerId, EventListener)> = lock(&self.listeners)
            .iter()
            .filter(|entry| entry.event_type == event.event_type())
            .map(|entry| (entry.id, Arc::clone(&entry.listener)))
            .collect();

        for (id, listener) in targets {
            let still_registered = lock(&self.listeners).iter().any(|entry| entry.id == id);
            if still_registered {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .count()
    }

    pub fn fail_widget_state_writes(&self, fail: bool) {
        lock(&self.state).fail_widget_state_writes = fail;
    }

    pub fn set_tool_response(&self, name: &str, response: CallToolResponse) {
        lock(&self.state)
            .tool_responses
            .insert(name.to_string(), response);
    }

    pub fn widget_state_writes(&self) -> Vec<Value> {
        lock(&self.records).widget_state_writes.clone()
    }

    pub fn display_mode_requests(&self) -> Vec<DisplayMode> {
        lock(&self.records).display_mode_requests.clone()
    }

    pub fn tool_calls(&self) -> Vec<(String, Map<String, Value>)> {
        lock(&self.records).tool_calls.clone()
    }

    pub fn follow_up_messages(&self) -> Vec<String> {
        lock(&self.records).follow_up_messages.clone()
    }

    pub fn opened_links(&self) -> Vec<String> {
        lock(&self.records).opened_links.clone()
    }

    fn device_type(&self) -> DeviceType {
        lock(&self.state)
            .globals
            .as_ref()
            .and_then(|globals| globals.user_agent)
            .map(|ua| ua.device.device_type)
            .unwrap_or_default()
    }

    fn write_widget_state(&self, value: Value) -> BoxFuture<'static, Result<()>> {
        lock(&self.records).widget_state_writes.push(value.clone());
        let fail = lock(&self.state).fail_widget_state_writes;
        let host = self.self_ref.clone();

        async move {
            if fail {
                return Err(anyhow!("widget state write rejected by host"));
            }
            let host = host
                .upgrade()
                .ok_or_else(|| anyhow!("host was dropped before the write landed"))?;
            debug!(state = %value, "memory host applying widget state");
            host.set_globals(GlobalsPatch {
                widget_state: Some(value),
                ..GlobalsPatch::default()
            });
            Ok(())
        }
        .boxed()
    }
}

impl HostEnvironment for MemoryHost {
    fn globals(&self) -> Option<Arc<OpenAiGlobals>> {
        lock(&self.state).globals.clone()
    }

    fn widget_state_setter(&self) -> Option<WidgetStateSetter> {
        if !lock(&self.state).setter_attached {
            return None;
        }
        let host = self.self_ref.clone();
        Some(Arc::new(move |value: Value| match host.upgrade() {
            Some(host) => host.write_widget_state(value),
            None => futures::future::ready(Err(anyhow!("host was dropped"))).boxed(),
        }))
    }

    fn api(&self) -> Option<Arc<dyn HostApi>> {
        if !lock(&self.state).api_attached {
            return None;
        }
        self.self_ref
            .upgrade()
            .map(|host| host as Arc<dyn HostApi>)
    }

    fn add_event_listener(&self, event_type: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push(RegisteredListener {
            id,
            event_type: event_type.to_string(),
            listener,
        });
        id
    }

    fn remove_event_listener(&self, event_type: &str, id: ListenerId) {
        lock(&self.listeners).retain(|entry| !(entry.id == id && entry.event_type == event_type));
    }
}

impl HostApi for MemoryHost {
    fn request_display_mode(&self, mode: DisplayMode) -> BoxFuture<'static, Result<DisplayMode>> {
        lock(&self.records).display_mode_requests.push(mode);
        let granted = match (mode, self.device_type()) {
            (DisplayMode::Pip, DeviceType::Mobile) => DisplayMode::Fullscreen,
            (requested, _) => requested,
        };
        let host = self.self_ref.clone();

        async move {
            if let Some(host) = host.upgrade() {
                host.set_globals(GlobalsPatch {
                    display_mode: Some(Some(granted)),
                    ..GlobalsPatch::default()
                });
            }
            Ok(granted)
        }
        .boxed()
    }

    fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> BoxFuture<'static, Result<CallToolResponse>> {
        lock(&self.records)
            .tool_calls
            .push((name.to_string(), args));
        let response = lock(&self.state).tool_responses.get(name).cloned();
        let name = name.to_string();

        async move { response.ok_or_else(|| anyhow!("unknown tool: {name}")) }.boxed()
    }

    fn send_follow_up_message(&self, prompt: &str) -> BoxFuture<'static, Result<()>> {
        lock(&self.records)
            .follow_up_messages
            .push(prompt.to_string());
        futures::future::ready(Ok(())).boxed()
    }

    fn open_external(&self, href: &str) {
        lock(&self.records).opened_links.push(href.to_string());
    }
}
