use crate::types::{DisplayMode, GlobalsPatch, OpenAiGlobals};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Scripted host/widget interaction replayed by the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Host mutates its globals and dispatches `openai:set_globals`.
    SetGlobals { globals: GlobalsPatch },
    /// Widget replaces its persisted state.
    WriteWidgetState {
        #[serde(default)]
        state: Value,
    },
    /// Widget merges `patch` into the state it last read.
    MergeWidgetState { patch: Map<String, Value> },
    RequestDisplayMode { mode: DisplayMode },
    CallTool {
        name: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// Host removes its global object.
    DetachHost,
    AttachHost {
        #[serde(default)]
        globals: Option<OpenAiGlobals>,
    },
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse scenario JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid scenario {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_step_kinds() {
        let scenario = Scenario::from_json(
            r#"{"steps": [
                {"action": "set_globals", "globals": {"toolOutput": null, "maxHeight": 400}},
                {"action": "write_widget_state", "state": {"count": 1}},
                {"action": "merge_widget_state", "patch": {"selected": "margherita"}},
                {"action": "request_display_mode", "mode": "pip"},
                {"action": "call_tool", "name": "hello_world"},
                {"action": "detach_host"},
                {"action": "attach_host"}
            ]}"#,
        )
        .expect("scenario");

        assert_eq!(scenario.steps.len(), 7);
        match &scenario.steps[0] {
            Step::SetGlobals { globals } => {
                assert_eq!(globals.tool_output, Some(Value::Null));
                assert_eq!(globals.max_height, Some(400.0));
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(
            scenario.steps[1],
            Step::WriteWidgetState {
                state: json!({"count": 1})
            }
        );
        assert_eq!(
            scenario.steps[4],
            Step::CallTool {
                name: "hello_world".to_string(),
                args: Map::new(),
            }
        );
        assert_eq!(scenario.steps[6], Step::AttachHost { globals: None });
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Scenario::from_json(r#"{"steps": [{"action": "explode"}]}"#).is_err());
    }
}
