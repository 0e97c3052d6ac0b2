//! Widget/host state synchronization for chat-embedded widgets.
//!
//! A widget rendered inside a chat host reads host-owned globals (display
//! mode, max height, tool output, persisted widget state, ...) that change
//! out-of-band, and writes its own state back through a privileged host
//! setter. [`bridge::Bridge`] is the widget-side adapter; [`host`] defines the
//! host boundary and an in-process implementation of it.

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod sim;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_support;

pub use bridge::{Bridge, SetStateAction, Subscription, ToolData, WidgetState};
pub use error::BridgeError;
pub use host::{HostApi, HostEnvironment, MemoryHost};
