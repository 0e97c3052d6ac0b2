//! Scenario replay: drives a [`MemoryHost`] through scripted host updates and
//! widget actions while a [`Bridge`] consumer records what it observes.

pub mod scenario;

use crate::bridge::{Bridge, SetStateAction, Subscription, ToolData};
use crate::host::MemoryHost;
use crate::types::{DisplayMode, GlobalKey};
use crate::util::{lock, settle};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub use scenario::{Scenario, Step};

/// One change notification as the widget saw it: the key named by the event
/// and the value read back from the host inside the callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub step: usize,
    pub key: GlobalKey,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallOutcome {
    pub name: String,
    pub result: Option<String>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimReport {
    pub observations: Vec<Observation>,
    pub display_mode: Option<DisplayMode>,
    pub max_height: Option<f64>,
    pub widget_props: Option<Value>,
    pub props_loading: bool,
    pub widget_state: Option<Value>,
    pub granted_display_modes: Vec<DisplayMode>,
    pub tool_calls: Vec<ToolCallOutcome>,
}

pub async fn run(host: Arc<MemoryHost>, scenario: &Scenario) -> SimReport {
    let bridge = Bridge::new(host.clone());
    let observations = Arc::new(Mutex::new(Vec::new()));
    let current_step = Arc::new(AtomicUsize::new(0));

    let subscriptions: Vec<Subscription> = GlobalKey::ALL
        .into_iter()
        .map(|key| {
            let reader = bridge.clone();
            let sink = Arc::clone(&observations);
            let step = Arc::clone(&current_step);
            bridge.subscribe(key, move || {
                lock(&sink).push(Observation {
                    step: step.load(Ordering::SeqCst),
                    key,
                    value: reader.read_key(key),
                });
            })
        })
        .collect();

    let mut granted_display_modes = Vec::new();
    let mut tool_calls = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        current_step.store(index, Ordering::SeqCst);
        info!(index, ?step, "replaying scenario step");

        match step {
            Step::SetGlobals { globals } => host.set_globals(globals.clone()),
            Step::WriteWidgetState { state } => {
                let writer = bridge.widget_state::<Value>();
                writer.set(SetStateAction::Replace(Some(state.clone())));
            }
            Step::MergeWidgetState { patch } => {
                let writer = bridge.widget_state::<Map<String, Value>>();
                let patch = patch.clone();
                writer.set(SetStateAction::update(
                    move |previous: Option<Map<String, Value>>| {
                        let mut merged = previous.unwrap_or_default();
                        merged.extend(patch);
                        Some(merged)
                    },
                ));
            }
            Step::RequestDisplayMode { mode } => match bridge.request_display_mode(*mode).await {
                Ok(granted) => granted_display_modes.push(granted),
                Err(err) => warn!(error = %err, "display mode request failed"),
            },
            Step::CallTool { name, args } => {
                let outcome = match bridge.call_tool(name, args.clone()).await {
                    Ok(response) => ToolCallOutcome {
                        name: name.clone(),
                        result: Some(response.result),
                        is_error: response.is_error,
                    },
                    Err(err) => {
                        warn!(tool = %name, error = %err, "tool call failed");
                        ToolCallOutcome {
                            name: name.clone(),
                            result: None,
                            is_error: true,
                        }
                    }
                };
                tool_calls.push(outcome);
            }
            Step::DetachHost => host.detach(),
            Step::AttachHost { globals } => host.attach(globals.clone().unwrap_or_default()),
        }

        settle().await;
    }

    drop(subscriptions);

    let props: ToolData<Value> = bridge.widget_props();
    let observations = std::mem::take(&mut *lock(&observations));
    SimReport {
        observations,
        display_mode: bridge.display_mode(),
        max_height: bridge.max_height(),
        widget_props: props.data,
        props_loading: props.is_loading,
        widget_state: bridge.widget_state::<Value>().into_current(),
        granted_display_modes,
        tool_calls,
    }
}
