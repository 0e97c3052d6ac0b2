use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Pip,
    Inline,
    Fullscreen,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Pip => "pip",
            DisplayMode::Inline => "inline",
            DisplayMode::Fullscreen => "fullscreen",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    pub insets: SafeAreaInsets,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    #[default]
    Unknown,
}

impl DeviceType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" => Some(DeviceType::Mobile),
            "tablet" => Some(DeviceType::Tablet),
            "desktop" => Some(DeviceType::Desktop),
            "unknown" => Some(DeviceType::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub hover: bool,
    pub touch: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgent {
    pub device: Device,
    pub capabilities: Capabilities,
}

/// Closed set of fields the host exposes on its global object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlobalKey {
    Theme,
    UserAgent,
    Locale,
    MaxHeight,
    DisplayMode,
    SafeArea,
    ToolInput,
    ToolOutput,
    ToolResponseMetadata,
    WidgetState,
    SetWidgetState,
}

impl GlobalKey {
    pub const ALL: [GlobalKey; 11] = [
        GlobalKey::Theme,
        GlobalKey::UserAgent,
        GlobalKey::Locale,
        GlobalKey::MaxHeight,
        GlobalKey::DisplayMode,
        GlobalKey::SafeArea,
        GlobalKey::ToolInput,
        GlobalKey::ToolOutput,
        GlobalKey::ToolResponseMetadata,
        GlobalKey::WidgetState,
        GlobalKey::SetWidgetState,
    ];

    /// Wire name used by the host's global object.
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalKey::Theme => "theme",
            GlobalKey::UserAgent => "userAgent",
            GlobalKey::Locale => "locale",
            GlobalKey::MaxHeight => "maxHeight",
            GlobalKey::DisplayMode => "displayMode",
            GlobalKey::SafeArea => "safeArea",
            GlobalKey::ToolInput => "toolInput",
            GlobalKey::ToolOutput => "toolOutput",
            GlobalKey::ToolResponseMetadata => "toolResponseMetadata",
            GlobalKey::WidgetState => "widgetState",
            GlobalKey::SetWidgetState => "setWidgetState",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)` so that "present but
/// null" stays distinguishable from "not provided".
pub(crate) fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Typed counterpart of [`deserialize_present`]: an explicit JSON `null`
/// becomes `Some(None)`, an absent field stays `None` via `#[serde(default)]`.
pub(crate) fn deserialize_nullable<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Snapshot of the host's global object. `None` fields have not been
/// populated by the host yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiGlobals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<UserAgent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_area: Option<SafeArea>,
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
}

impl OpenAiGlobals {
    /// Raw JSON view of one field, used by logging and the simulator.
    pub fn value_of(&self, key: GlobalKey) -> Option<Value> {
        fn json<T: Serialize>(value: &Option<T>) -> Option<Value> {
            value
                .as_ref()
                .and_then(|inner| serde_json::to_value(inner).ok())
        }

        match key {
            GlobalKey::Theme => json(&self.theme),
            GlobalKey::UserAgent => json(&self.user_agent),
            GlobalKey::Locale => json(&self.locale),
            GlobalKey::MaxHeight => json(&self.max_height),
            GlobalKey::DisplayMode => json(&self.display_mode),
            GlobalKey::SafeArea => json(&self.safe_area),
            GlobalKey::ToolInput => self.tool_input.clone(),
            GlobalKey::ToolOutput => self.tool_output.clone(),
            GlobalKey::ToolResponseMetadata => self.tool_response_metadata.clone(),
            GlobalKey::WidgetState => self.widget_state.clone(),
            GlobalKey::SetWidgetState => None,
        }
    }
}
