//! Per-endpoint loading registry with change notifications.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every `ApiClient::request` holds a `LoadingGuard` for its endpoint from
//! the first attempt until it returns. Spinners and progress bars subscribe
//! here (or, in the browser, to the `api-loading-change` DOM event) instead
//! of threading flags through every caller.
//!
//! Concurrent requests to one endpoint are counted, not coalesced: the
//! endpoint stays loading until the last of them finishes.

#[cfg(test)]
#[path = "loading_test.rs"]
mod loading_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Payload emitted on every loading transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadingChange {
    pub endpoint: String,
    pub is_loading: bool,
    /// Distinct endpoints still loading after this change.
    pub total_loading: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&LoadingChange)>;

#[derive(Default)]
struct Inner {
    in_flight: BTreeMap<String, usize>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

/// Shared handle; clones observe and mutate the same registry.
#[derive(Clone, Default)]
pub struct LoadingRegistry {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for LoadingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LoadingRegistry")
            .field("in_flight", &inner.in_flight)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl LoadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `endpoint` as loading until the returned guard is dropped.
    #[must_use = "the endpoint stops loading as soon as the guard is dropped"]
    pub fn begin(&self, endpoint: &str) -> LoadingGuard {
        let total = {
            let mut inner = self.inner.borrow_mut();
            *inner.in_flight.entry(endpoint.to_owned()).or_insert(0) += 1;
            inner.in_flight.len()
        };
        self.emit(&LoadingChange {
            endpoint: endpoint.to_owned(),
            is_loading: true,
            total_loading: total,
        });
        LoadingGuard { registry: self.clone(), endpoint: endpoint.to_owned() }
    }

    fn end(&self, endpoint: &str) {
        let change = {
            let mut inner = self.inner.borrow_mut();
            let Some(count) = inner.in_flight.get_mut(endpoint) else {
                return;
            };
            *count -= 1;
            let still_loading = *count > 0;
            if !still_loading {
                inner.in_flight.remove(endpoint);
            }
            LoadingChange {
                endpoint: endpoint.to_owned(),
                is_loading: still_loading,
                total_loading: inner.in_flight.len(),
            }
        };
        self.emit(&change);
    }

    pub fn is_loading(&self, endpoint: &str) -> bool {
        self.inner.borrow().in_flight.contains_key(endpoint)
    }

    pub fn any_loading(&self) -> bool {
        !self.inner.borrow().in_flight.is_empty()
    }

    pub fn total_loading(&self) -> usize {
        self.inner.borrow().in_flight.len()
    }

    /// Endpoints currently loading, sorted.
    pub fn loading_endpoints(&self) -> Vec<String> {
        self.inner.borrow().in_flight.keys().cloned().collect()
    }

    pub fn subscribe(&self, listener: impl Fn(&LoadingChange) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    // Listeners run with the registry unborrowed so they may query it.
    fn emit(&self, change: &LoadingChange) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

/// Releases one in-flight slot for its endpoint on drop.
#[derive(Debug)]
pub struct LoadingGuard {
    registry: LoadingRegistry,
    endpoint: String,
}

impl LoadingGuard {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.registry.end(&self.endpoint);
    }
}
