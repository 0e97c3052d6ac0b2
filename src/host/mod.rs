//! Boundary with the embedding host.
//!
//! The host owns the global state and mutates it out-of-band. The bridge only
//! ever sees it through [`HostEnvironment`], which is passed in explicitly so
//! tests and the simulator can substitute [`memory::MemoryHost`].

pub mod memory;

use crate::types::{CallToolResponse, DisplayMode, HostEvent, OpenAiGlobals};
use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub use memory::MemoryHost;

pub type EventListener = Arc<dyn Fn(&HostEvent) + Send + Sync>;

/// The host's privileged `setWidgetState`. Calling it issues the write; the
/// returned future resolves once the host has acknowledged it.
pub type WidgetStateSetter = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Imperative calls a widget can make into the host.
pub trait HostApi: Send + Sync {
    /// Ask for a display mode. The host answers with the mode it granted,
    /// which may differ from the one requested.
    fn request_display_mode(&self, mode: DisplayMode) -> BoxFuture<'static, Result<DisplayMode>>;

    fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> BoxFuture<'static, Result<CallToolResponse>>;

    fn send_follow_up_message(&self, prompt: &str) -> BoxFuture<'static, Result<()>>;

    fn open_external(&self, href: &str);
}

/// The runtime environment the widget is embedded in: the host's global
/// object (possibly not attached yet) plus the global event target.
pub trait HostEnvironment: Send + Sync {
    /// Current globals, or `None` when no host object is attached.
    fn globals(&self) -> Option<Arc<OpenAiGlobals>>;

    fn widget_state_setter(&self) -> Option<WidgetStateSetter>;

    fn api(&self) -> Option<Arc<dyn HostApi>>;

    fn add_event_listener(&self, event_type: &str, listener: EventListener) -> ListenerId;

    /// Removing an unknown id is a no-op.
    fn remove_event_listener(&self, event_type: &str, id: ListenerId);
}
