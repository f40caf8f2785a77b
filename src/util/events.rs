//! Page-wide broadcast of loading-state changes.
//!
//! SYSTEM CONTEXT
//! ==============
//! Non-Rust page scripts observe API activity through a DOM `CustomEvent`
//! dispatched on `window`. The detail object mirrors `LoadingChange` with
//! camelCase keys.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use crate::net::loading::{ListenerId, LoadingChange, LoadingRegistry};

pub const LOADING_EVENT: &str = "api-loading-change";

/// JSON detail carried by the `api-loading-change` event.
pub fn loading_event_detail(change: &LoadingChange) -> serde_json::Value {
    serde_json::json!({
        "endpoint": change.endpoint,
        "isLoading": change.is_loading,
        "totalLoading": change.total_loading,
    })
}

/// Re-broadcast every registry change as a DOM event.
pub fn forward_loading_events(registry: &LoadingRegistry) -> ListenerId {
    registry.subscribe(dispatch_loading_change)
}

#[cfg(feature = "hydrate")]
fn dispatch_loading_change(change: &LoadingChange) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let detail = loading_event_detail(change).to_string();
    let Ok(detail) = js_sys::JSON::parse(&detail) else {
        return;
    };
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    match web_sys::CustomEvent::new_with_event_init_dict(LOADING_EVENT, &init) {
        Ok(event) => {
            let _ = window.dispatch_event(&event);
        }
        Err(e) => log::warn!("failed to build {LOADING_EVENT} event: {e:?}"),
    }
}

#[cfg(not(feature = "hydrate"))]
fn dispatch_loading_change(change: &LoadingChange) {
    log::trace!("{LOADING_EVENT}: {}", loading_event_detail(change));
}
