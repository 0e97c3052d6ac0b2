use super::{Bridge, Disposer, Subscription};
use crate::host::{HostEnvironment, WidgetStateSetter};
use crate::types::{DisplayMode, GlobalKey, SafeArea, Theme, UserAgent};
use crate::util::lock;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Mutex;

/// One named field of the host's global object and how to read it.
pub trait GlobalField: 'static {
    const KEY: GlobalKey;
    type Value: Clone + Send + Sync + 'static;

    fn read(env: &dyn HostEnvironment) -> Option<Self::Value>;
}

macro_rules! global_field {
    ($(#[$meta:meta])* $marker:ident, $key:ident, $field:ident, $value:ty) => {
        $(#[$meta])*
        pub struct $marker;

        impl GlobalField for $marker {
            const KEY: GlobalKey = GlobalKey::$key;
            type Value = $value;

            fn read(env: &dyn HostEnvironment) -> Option<$value> {
                env.globals().and_then(|globals| globals.$field.clone())
            }
        }
    };
}

global_field!(ThemeField, Theme, theme, Theme);
global_field!(UserAgentField, UserAgent, user_agent, UserAgent);
global_field!(LocaleField, Locale, locale, String);
global_field!(MaxHeightField, MaxHeight, max_height, f64);
global_field!(DisplayModeField, DisplayMode, display_mode, DisplayMode);
global_field!(SafeAreaField, SafeArea, safe_area, SafeArea);
global_field!(ToolInputField, ToolInput, tool_input, Value);
global_field!(
    /// May hold an explicit JSON `null`.
    ToolOutputField,
    ToolOutput,
    tool_output,
    Value
);
global_field!(
    /// May hold an explicit JSON `null`.
    ToolResponseMetadataField,
    ToolResponseMetadata,
    tool_response_metadata,
    Value
);
global_field!(
    /// May hold an explicit JSON `null`.
    WidgetStateField,
    WidgetState,
    widget_state,
    Value
);

pub struct SetWidgetStateField;

impl GlobalField for SetWidgetStateField {
    const KEY: GlobalKey = GlobalKey::SetWidgetState;
    type Value = WidgetStateSetter;

    fn read(env: &dyn HostEnvironment) -> Option<WidgetStateSetter> {
        env.widget_state_setter()
    }
}

/// Read-only view of a single field for one consumer.
///
/// An accessor holds at most one live subscription: subscribing again tears
/// down the previous one first, so a remounting consumer never double-fires.
pub struct FieldAccessor<F: GlobalField> {
    bridge: Bridge,
    current: Mutex<Option<Subscription>>,
    _field: PhantomData<fn() -> F>,
}

impl<F: GlobalField> FieldAccessor<F> {
    pub(crate) fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            current: Mutex::new(None),
            _field: PhantomData,
        }
    }

    pub fn key(&self) -> GlobalKey {
        F::KEY
    }

    pub fn get(&self) -> Option<F::Value> {
        self.bridge.snapshot::<F>()
    }

    pub fn subscribe<C>(&self, on_change: C) -> Disposer
    where
        C: Fn() + Send + Sync + 'static,
    {
        let previous = lock(&self.current).take();
        drop(previous);

        let subscription = self.bridge.subscribe(F::KEY, on_change);
        let disposer = subscription.disposer();
        *lock(&self.current) = Some(subscription);
        disposer
    }

    pub fn unsubscribe(&self) {
        let previous = lock(&self.current).take();
        drop(previous);
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.current)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}
