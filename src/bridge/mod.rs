//! Widget side of the host synchronization layer.
//!
//! [`Bridge`] adapts the host's out-of-band global object to the
//! subscribe / get-snapshot pair reactive consumers expect:
//!
//! - [`Bridge::subscribe`] registers a listener on the host's
//!   `openai:set_globals` channel and calls back only when the changed-field
//!   set of an event names the subscribed key.
//! - [`Bridge::snapshot`] reads the live value straight from the host on every
//!   call. Nothing is cached, so a read after a notification is never stale
//!   and a change that lands before the first read is never lost.
//!
//! With no host environment every operation degrades to `None` / no-op.

pub mod derived;
pub mod field;
pub mod subscription;

use crate::error::{BridgeError, Result};
use crate::host::{EventListener, HostApi, HostEnvironment};
use crate::types::{
    CallToolResponse, DisplayMode, GlobalKey, HostEvent, OpenAiGlobals, Theme,
    SET_GLOBALS_EVENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub use derived::{SetStateAction, ToolData, WidgetState};
pub use field::{
    DisplayModeField, FieldAccessor, GlobalField, LocaleField, MaxHeightField, SafeAreaField,
    SetWidgetStateField, ThemeField, ToolInputField, ToolOutputField, ToolResponseMetadataField,
    UserAgentField, WidgetStateField,
};
pub use subscription::{Disposer, Subscription};

#[derive(Clone, Default)]
pub struct Bridge {
    env: Option<Arc<dyn HostEnvironment>>,
}

impl Bridge {
    pub fn new(env: Arc<dyn HostEnvironment>) -> Self {
        Self { env: Some(env) }
    }

    /// A bridge running outside any host environment.
    pub fn detached() -> Self {
        Self { env: None }
    }

    pub fn has_environment(&self) -> bool {
        self.env.is_some()
    }

    pub fn globals(&self) -> Option<Arc<OpenAiGlobals>> {
        self.env.as_ref().and_then(|env| env.globals())
    }

    /// Calls `on_change` once per host change event whose changed-field set
    /// contains `key`. The callback carries no value: read it with
    /// [`Bridge::snapshot`].
    pub fn subscribe<C>(&self, key: GlobalKey, on_change: C) -> Subscription
    where
        C: Fn() + Send + Sync + 'static,
    {
        let Some(env) = &self.env else {
            return Subscription::inert(key);
        };

        let active = Arc::new(AtomicBool::new(true));
        let still_active = Arc::clone(&active);
        let listener: EventListener = Arc::new(move |event: &HostEvent| {
            let HostEvent::SetGlobals(change) = event else {
                return;
            };
            if !change.globals.contains(key) || !still_active.load(Ordering::SeqCst) {
                return;
            }
            on_change();
        });

        let listener_id = env.add_event_listener(SET_GLOBALS_EVENT_TYPE, listener);
        debug!(key = %key, listener = %listener_id, "subscribed to host global");
        Subscription::registered(Arc::clone(env), key, listener_id, active)
    }

    pub fn snapshot<F: GlobalField>(&self) -> Option<F::Value> {
        self.env.as_ref().and_then(|env| F::read(env.as_ref()))
    }

    /// Untyped snapshot of one field as the host would serialize it.
    pub fn read_key(&self, key: GlobalKey) -> Option<Value> {
        self.globals().and_then(|globals| globals.value_of(key))
    }

    pub fn field<F: GlobalField>(&self) -> FieldAccessor<F> {
        FieldAccessor::new(self.clone())
    }

    pub fn display_mode(&self) -> Option<DisplayMode> {
        self.snapshot::<DisplayModeField>()
    }

    pub fn max_height(&self) -> Option<f64> {
        self.snapshot::<MaxHeightField>()
    }

    pub fn theme(&self) -> Option<Theme> {
        self.snapshot::<ThemeField>()
    }

    pub fn locale(&self) -> Option<String> {
        self.snapshot::<LocaleField>()
    }

    /// The tool output as widget props, `is_loading` until the host has
    /// delivered a non-null value.
    pub fn widget_props<T: DeserializeOwned>(&self) -> ToolData<T> {
        ToolData::from_global(GlobalKey::ToolOutput, self.snapshot::<ToolOutputField>())
    }

    pub fn widget_meta<T: DeserializeOwned>(&self) -> ToolData<T> {
        ToolData::from_global(
            GlobalKey::ToolResponseMetadata,
            self.snapshot::<ToolResponseMetadataField>(),
        )
    }

    /// Reads the persisted widget state together with a writer bound to the
    /// value read here.
    pub fn widget_state<T>(&self) -> WidgetState<T>
    where
        T: DeserializeOwned + Serialize + Clone,
    {
        WidgetState::new(
            self.snapshot::<WidgetStateField>(),
            self.snapshot::<SetWidgetStateField>(),
        )
    }

    fn host_api(&self) -> Result<Arc<dyn HostApi>> {
        self.env
            .as_ref()
            .and_then(|env| env.api())
            .ok_or(BridgeError::HostAbsent)
    }

    pub async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode> {
        let api = self.host_api()?;
        let granted = api
            .request_display_mode(mode)
            .await
            .map_err(BridgeError::host_rejected)?;
        if granted != mode {
            debug!(
                requested = mode.as_str(),
                granted = granted.as_str(),
                "host coerced display mode"
            );
        }
        Ok(granted)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> Result<CallToolResponse> {
        let api = self.host_api()?;
        api.call_tool(name, args)
            .await
            .map_err(BridgeError::host_rejected)
    }

    pub async fn send_follow_up_message(&self, prompt: &str) -> Result<()> {
        let api = self.host_api()?;
        api.send_follow_up_message(prompt)
            .await
            .map_err(BridgeError::host_rejected)
    }

    pub fn open_external(&self, href: &str) -> Result<()> {
        self.host_api()?.open_external(href);
        Ok(())
    }
}
