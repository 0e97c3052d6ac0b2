use super::globals::{
    deserialize_nullable, deserialize_present, DisplayMode, GlobalKey, OpenAiGlobals, SafeArea,
    Theme, UserAgent,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type the host dispatches whenever any global changes.
pub const SET_GLOBALS_EVENT_TYPE: &str = "openai:set_globals";

/// Partial mapping of the globals changed by one host update. A field is
/// `Some` only if the host changed it. A typed field explicitly set to JSON
/// `null` is `Some(None)` and clears the global; an untyped one is
/// `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalsPatch {
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub theme: Option<Option<Theme>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_agent: Option<Option<UserAgent>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub locale: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_height: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_mode: Option<Option<DisplayMode>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub safe_area: Option<Option<SafeArea>>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_input: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_output: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_response_metadata: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub widget_state: Option<Value>,
    /// The privileged setter was installed or replaced. Functions never travel
    /// over the wire, so this is only set by in-process hosts.
    #[serde(skip)]
    pub set_widget_state: bool,
}

impl GlobalsPatch {
    pub fn contains(&self, key: GlobalKey) -> bool {
        match key {
            GlobalKey::Theme => self.theme.is_some(),
            GlobalKey::UserAgent => self.user_agent.is_some(),
            GlobalKey::Locale => self.locale.is_some(),
            GlobalKey::MaxHeight => self.max_height.is_some(),
            GlobalKey::DisplayMode => self.display_mode.is_some(),
            GlobalKey::SafeArea => self.safe_area.is_some(),
            GlobalKey::ToolInput => self.tool_input.is_some(),
            GlobalKey::ToolOutput => self.tool_output.is_some(),
            GlobalKey::ToolResponseMetadata => self.tool_response_metadata.is_some(),
            GlobalKey::WidgetState => self.widget_state.is_some(),
            GlobalKey::SetWidgetState => self.set_widget_state,
        }
    }

    pub fn changed_keys(&self) -> Vec<GlobalKey> {
        GlobalKey::ALL
            .into_iter()
            .filter(|key| self.contains(*key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_keys().is_empty()
    }

    /// Writes every present field into `globals`.
    pub fn apply_to(&self, globals: &mut OpenAiGlobals) {
        if let Some(theme) = self.theme {
            globals.theme = theme;
        }
        if let Some(user_agent) = self.user_agent {
            globals.user_agent = user_agent;
        }
        if let Some(locale) = &self.locale {
            globals.locale = locale.clone();
        }
        if let Some(max_height) = self.max_height {
            globals.max_height = max_height;
        }
        if let Some(display_mode) = self.display_mode {
            globals.display_mode = display_mode;
        }
        if let Some(safe_area) = self.safe_area {
            globals.safe_area = safe_area;
        }
        if let Some(tool_input) = &self.tool_input {
            globals.tool_input = Some(tool_input.clone());
        }
        if let Some(tool_output) = &self.tool_output {
            globals.tool_output = Some(tool_output.clone());
        }
        if let Some(metadata) = &self.tool_response_metadata {
            globals.tool_response_metadata = Some(metadata.clone());
        }
        if let Some(widget_state) = &self.widget_state {
            globals.widget_state = Some(widget_state.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetGlobalsEvent {
    pub globals: GlobalsPatch,
}

/// Anything dispatched on the host's global event target.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    SetGlobals(SetGlobalsEvent),
    Other { event_type: String, detail: Value },
}

impl HostEvent {
    pub fn set_globals(globals: GlobalsPatch) -> Self {
        HostEvent::SetGlobals(SetGlobalsEvent { globals })
    }

    pub fn event_type(&self) -> &str {
        match self {
            HostEvent::SetGlobals(_) => SET_GLOBALS_EVENT_TYPE,
            HostEvent::Other { event_type, .. } => event_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResponse {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub private_meta: Option<Map<String, Value>>,
}
