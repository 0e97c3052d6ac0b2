use crate::error::BridgeError;
use crate::host::WidgetStateSetter;
use crate::types::GlobalKey;
use anyhow::Result;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Tool-provided data as a widget sees it: nothing and loading until the
/// host delivers a non-null value.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolData<T> {
    pub data: Option<T>,
    pub is_loading: bool,
}

impl<T> ToolData<T> {
    pub fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
        }
    }
}

impl<T: DeserializeOwned> ToolData<T> {
    pub(crate) fn from_global(key: GlobalKey, value: Option<Value>) -> Self {
        match decode_nullable(key, value) {
            Some(data) => Self::ready(data),
            None => Self::loading(),
        }
    }
}

/// `None` for absent or JSON `null` values. Values that do not fit `T` are
/// logged and treated as absent.
fn decode_nullable<T: DeserializeOwned>(key: GlobalKey, value: Option<Value>) -> Option<T> {
    let value = value.filter(|value| !value.is_null())?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(key = %key, error = %BridgeError::from(err), "host global has unexpected shape");
            None
        }
    }
}

/// Argument to [`WidgetState::set`]: a replacement value, or a function of the
/// state the writer was created with.
pub enum SetStateAction<T> {
    Replace(Option<T>),
    Update(Box<dyn FnOnce(Option<T>) -> Option<T>>),
}

impl<T> SetStateAction<T> {
    pub fn update(updater: impl FnOnce(Option<T>) -> Option<T> + 'static) -> Self {
        SetStateAction::Update(Box::new(updater))
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        SetStateAction::Replace(Some(value))
    }
}

/// Persisted widget state: the value read from the host plus a writer that
/// forwards to the host's privileged setter.
///
/// Writes are requests to the host, not local mutations. The new value shows
/// up in [`WidgetState::current`] only after the host applies it and a fresh
/// `WidgetState` is read.
pub struct WidgetState<T> {
    current: Option<T>,
    setter: Option<WidgetStateSetter>,
}

impl<T> WidgetState<T>
where
    T: DeserializeOwned + Serialize + Clone,
{
    pub(crate) fn new(raw: Option<Value>, setter: Option<WidgetStateSetter>) -> Self {
        Self {
            current: decode_nullable(GlobalKey::WidgetState, raw),
            setter,
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn into_current(self) -> Option<T> {
        self.current
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    /// Fire-and-forget write. Never fails from the caller's point of view:
    /// a missing setter, a null result, or a host rejection are only logged.
    pub fn set(&self, action: impl Into<SetStateAction<T>>) {
        let Some(setter) = &self.setter else {
            warn!(error = %BridgeError::SetterUnavailable, "widget state write dropped");
            return;
        };

        let next = match action.into() {
            SetStateAction::Replace(next) => next,
            SetStateAction::Update(updater) => updater(self.current.clone()),
        };
        let Some(next) = next else {
            debug!(error = %BridgeError::NullWritePayload, "widget state write ignored");
            return;
        };

        let payload = match serde_json::to_value(&next) {
            Ok(Value::Null) => {
                debug!(error = %BridgeError::NullWritePayload, "widget state write ignored");
                return;
            }
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %BridgeError::from(err), "widget state write dropped");
                return;
            }
        };

        persist_in_background(setter(payload));
    }
}

async fn await_acknowledgement(pending: BoxFuture<'static, Result<()>>) {
    if let Err(err) = pending.await {
        warn!(error = %BridgeError::rejected(err), "setWidgetState could not be persisted");
    }
}

fn persist_in_background(pending: BoxFuture<'static, Result<()>>) {
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        runtime.spawn(await_acknowledgement(pending));
        return;
    }

    debug!("no async runtime; driving widget state acknowledgement on a helper thread");
    let spawned = std::thread::Builder::new()
        .name("widget-state-ack".to_string())
        .spawn(move || futures::executor::block_on(await_acknowledgement(pending)));
    if let Err(err) = spawned {
        warn!(error = %err, "could not start a thread for the widget state acknowledgement");
    }
}
