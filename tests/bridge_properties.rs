use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use widget_sync::bridge::{Bridge, SetStateAction, ToolData};
use widget_sync::host::{HostEnvironment, MemoryHost};
use widget_sync::types::{
    DisplayMode, GlobalKey, GlobalsPatch, HostEvent, OpenAiGlobals, SET_GLOBALS_EVENT_TYPE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Counter {
    count: u32,
}

fn counting(hits: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
    let hits = Arc::clone(hits);
    move || {
        hits.fetch_add(1, Ordering::SeqCst);
    }
}

fn patch_max_height(height: f64) -> GlobalsPatch {
    GlobalsPatch {
        max_height: Some(Some(height)),
        ..GlobalsPatch::default()
    }
}

#[test]
fn test_no_missed_updates_and_fresh_snapshots() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let reader = bridge.clone();
    let sink = Arc::clone(&seen);
    let _sub = bridge.subscribe(GlobalKey::MaxHeight, move || {
        sink.lock().unwrap().push(reader.max_height());
    });

    host.set_globals(patch_max_height(100.0));
    host.set_globals(GlobalsPatch {
        locale: Some(Some("en-GB".to_string())),
        ..GlobalsPatch::default()
    });
    host.set_globals(patch_max_height(250.0));

    assert_eq!(*seen.lock().unwrap(), vec![Some(100.0), Some(250.0)]);
}

#[test]
fn test_change_before_first_read_is_not_lost() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = bridge.subscribe(GlobalKey::DisplayMode, counting(&hits));

    host.set_globals(GlobalsPatch {
        display_mode: Some(Some(DisplayMode::Fullscreen)),
        ..GlobalsPatch::default()
    });

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.display_mode(), Some(DisplayMode::Fullscreen));
}

#[test]
fn test_event_payload_is_a_signal_not_the_value() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reader = bridge.clone();
    let sink = Arc::clone(&seen);
    let _sub = bridge.subscribe(GlobalKey::MaxHeight, move || {
        sink.lock().unwrap().push(reader.max_height());
    });

    // the host applied 640 but the event it dispatched still carries 480
    host.set_globals_silently(&patch_max_height(640.0));
    host.dispatch(&HostEvent::set_globals(patch_max_height(480.0)));

    assert_eq!(*seen.lock().unwrap(), vec![Some(640.0)]);
}

#[test]
fn test_unsubscribe_is_terminal() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let hits = Arc::new(AtomicUsize::new(0));
    let sub = bridge.subscribe(GlobalKey::MaxHeight, counting(&hits));

    host.set_globals(patch_max_height(1.0));
    sub.unsubscribe();
    sub.unsubscribe();
    for height in [2.0, 3.0] {
        host.set_globals(patch_max_height(height));
    }
    host.set_globals(GlobalsPatch {
        theme: Some(Some(widget_sync::types::Theme::Dark)),
        ..GlobalsPatch::default()
    });

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(host.listener_count(SET_GLOBALS_EVENT_TYPE), 0);
}

#[test]
fn test_host_absent_safety() {
    let bridge = Bridge::detached();
    let hits = Arc::new(AtomicUsize::new(0));

    let sub = bridge.subscribe(GlobalKey::ToolOutput, counting(&hits));
    sub.unsubscribe();
    assert_eq!(bridge.read_key(GlobalKey::ToolOutput), None);
    assert_eq!(bridge.max_height(), None);
    assert_eq!(bridge.widget_props::<Value>(), ToolData::loading());
    assert_eq!(bridge.widget_meta::<Value>(), ToolData::loading());

    let state = bridge.widget_state::<Counter>();
    assert_eq!(state.current(), None);
    state.set(Counter { count: 1 });

    // event target present, host object not injected yet
    let host = MemoryHost::detached();
    let bridge = Bridge::new(host.clone());
    let _sub = bridge.subscribe(GlobalKey::ToolOutput, counting(&hits));
    assert_eq!(bridge.field::<widget_sync::bridge::ToolOutputField>().get(), None);
    bridge.widget_state::<Counter>().set(Counter { count: 1 });
    assert!(host.widget_state_writes().is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_null_writes_never_reach_the_host() {
    let host = MemoryHost::new(OpenAiGlobals {
        widget_state: Some(json!({"count": 3})),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());

    let state = bridge.widget_state::<Counter>();
    state.set(SetStateAction::Replace(None));
    state.set(SetStateAction::update(|_prev: Option<Counter>| None));
    bridge
        .widget_state::<Value>()
        .set(SetStateAction::Replace(Some(Value::Null)));

    assert!(host.widget_state_writes().is_empty());
}

#[tokio::test]
async fn test_updater_sees_last_known_value() {
    let host = MemoryHost::new(OpenAiGlobals {
        widget_state: Some(json!({"count": 3})),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());

    let state = bridge.widget_state::<Counter>();
    state.set(SetStateAction::update(|prev: Option<Counter>| {
        prev.map(|prev| Counter {
            count: prev.count + 1,
        })
    }));

    assert_eq!(host.widget_state_writes(), vec![json!({"count": 4})]);
}

#[tokio::test]
async fn test_updater_uses_value_captured_at_read_time() {
    let host = MemoryHost::new(OpenAiGlobals {
        widget_state: Some(json!({"count": 3})),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());
    let state = bridge.widget_state::<Counter>();

    host.set_globals(GlobalsPatch {
        widget_state: Some(json!({"count": 10})),
        ..GlobalsPatch::default()
    });
    state.set(SetStateAction::update(|prev: Option<Counter>| {
        prev.map(|prev| Counter {
            count: prev.count + 1,
        })
    }));

    assert_eq!(host.widget_state_writes(), vec![json!({"count": 4})]);
    assert_eq!(
        bridge.widget_state::<Counter>().into_current(),
        Some(Counter { count: 10 })
    );
}

#[tokio::test]
async fn test_rejected_persistence_is_not_surfaced() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    host.fail_widget_state_writes(true);
    let bridge = Bridge::new(host.clone());

    bridge.widget_state::<Counter>().set(Counter { count: 7 });
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    assert_eq!(host.widget_state_writes(), vec![json!({"count": 7})]);
    assert_eq!(bridge.widget_state::<Counter>().current(), None);
}

#[test]
fn test_setter_unavailable_is_a_no_op() {
    let host = MemoryHost::without_setter(OpenAiGlobals {
        widget_state: Some(json!({"count": 1})),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());
    let state = bridge.widget_state::<Counter>();

    assert!(!state.can_write());
    state.set(Counter { count: 2 });
    assert!(host.widget_state_writes().is_empty());
    assert!(host.widget_state_setter().is_none());
}

#[test]
fn test_derived_loading_semantics() {
    let host = MemoryHost::new(OpenAiGlobals {
        tool_output: Some(Value::Null),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());
    let views = Arc::new(Mutex::new(vec![bridge.widget_props::<Value>()]));

    let reader = bridge.clone();
    let sink = Arc::clone(&views);
    let _sub = bridge.subscribe(GlobalKey::ToolOutput, move || {
        sink.lock().unwrap().push(reader.widget_props::<Value>());
    });

    host.set_globals(GlobalsPatch {
        tool_output: Some(json!({"foo": "bar"})),
        ..GlobalsPatch::default()
    });

    let views = views.lock().unwrap();
    assert_eq!(views[0].data, None);
    assert!(views[0].is_loading);
    assert_eq!(views[1].data, Some(json!({"foo": "bar"})));
    assert!(!views[1].is_loading);
}

#[test]
fn test_widget_meta_follows_response_metadata() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    assert!(bridge.widget_meta::<Value>().is_loading);

    host.set_globals(GlobalsPatch {
        tool_response_metadata: Some(json!({"author": "pizzaz"})),
        ..GlobalsPatch::default()
    });

    assert_eq!(
        bridge.widget_meta::<Value>().data,
        Some(json!({"author": "pizzaz"}))
    );
    assert!(bridge.widget_props::<Value>().is_loading);
}

#[test]
fn test_independent_field_isolation() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let theme_hits = Arc::new(AtomicUsize::new(0));
    let locale_hits = Arc::new(AtomicUsize::new(0));
    let _theme = bridge.subscribe(GlobalKey::Theme, counting(&theme_hits));
    let _locale = bridge.subscribe(GlobalKey::Locale, counting(&locale_hits));

    host.set_globals(GlobalsPatch {
        locale: Some(Some("es-ES".to_string())),
        ..GlobalsPatch::default()
    });

    assert_eq!(theme_hits.load(Ordering::SeqCst), 0);
    assert_eq!(locale_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_other_event_types_are_ignored() {
    let host = MemoryHost::new(OpenAiGlobals::default());
    let bridge = Bridge::new(host.clone());
    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = bridge.subscribe(GlobalKey::ToolOutput, counting(&hits));

    host.add_event_listener(
        "openai:tool_response",
        Arc::new(|_event: &HostEvent| {}),
    );
    host.dispatch(&HostEvent::Other {
        event_type: SET_GLOBALS_EVENT_TYPE.to_string(),
        detail: json!({"globals": {"toolOutput": {"foo": "bar"}}}),
    });
    host.dispatch(&HostEvent::Other {
        event_type: "openai:tool_response".to_string(),
        detail: json!({}),
    });

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_explicit_null_notifies_typed_field() {
    let host = MemoryHost::new(OpenAiGlobals {
        locale: Some("en-US".to_string()),
        ..OpenAiGlobals::default()
    });
    let bridge = Bridge::new(host.clone());
    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = bridge.subscribe(GlobalKey::Locale, counting(&hits));

    let patch: GlobalsPatch = serde_json::from_value(json!({"locale": null})).expect("patch");
    host.set_globals(patch);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.locale(), None);
}
