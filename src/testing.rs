//! In-memory fakes shared by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::net::api::{ApiClient, ApiConfig};
use crate::net::loading::LoadingRegistry;
use crate::net::retry::RetryPolicy;
use crate::net::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::util::location::Navigator;
use crate::util::storage::MemoryTokenStore;

type Probe = Box<dyn Fn(&HttpRequest)>;

/// Transport that replays scripted outcomes and records what it saw.
/// Once the script runs out every request gets `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    pub requests: RefCell<Vec<HttpRequest>>,
    pub sleeps: RefCell<Vec<Duration>>,
    probe: RefCell<Option<Probe>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self { script: RefCell::new(script.into()), ..Self::default() }
    }

    pub fn respond(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(status, body))
    }

    pub fn offline() -> Result<HttpResponse, TransportError> {
        Err(TransportError::Network("Failed to fetch".to_owned()))
    }

    /// Run `probe` on every request before answering it.
    pub fn set_probe(&self, probe: impl Fn(&HttpRequest) + 'static) {
        *self.probe.borrow_mut() = Some(Box::new(probe));
    }

    pub fn attempts(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().expect("no request sent")
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(probe) = self.probe.borrow().as_ref() {
            probe(request);
        }
        self.requests.borrow_mut().push(request.clone());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
    }

    async fn sleep(&self, delay: Duration) {
        self.sleeps.borrow_mut().push(delay);
    }
}

/// Navigator that records redirect targets.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub visits: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.visits.borrow_mut().push(path.to_owned());
    }
}

/// Client wired to fakes, plus handles to inspect them.
pub struct TestClient {
    pub api: ApiClient<ScriptedTransport>,
    pub store: Rc<MemoryTokenStore>,
    pub navigator: Rc<RecordingNavigator>,
}

pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(100),
        retryable_statuses: vec![429, 500, 502, 503, 504],
    }
}

pub fn test_client(script: Vec<Result<HttpResponse, TransportError>>) -> TestClient {
    test_client_with_store(script, MemoryTokenStore::new())
}

pub fn test_client_with_store(
    script: Vec<Result<HttpResponse, TransportError>>,
    store: MemoryTokenStore,
) -> TestClient {
    let store = Rc::new(store);
    let navigator = Rc::new(RecordingNavigator::default());
    let config = ApiConfig::for_hostname("partnerhub.example").with_retry(test_policy());
    let api = ApiClient::new(
        ScriptedTransport::new(script),
        config,
        store.clone(),
        navigator.clone(),
        LoadingRegistry::new(),
    );
    TestClient { api, store, navigator }
}

/// Nav surface that records every instruction it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub renders: RefCell<Vec<crate::nav::view::NavView>>,
    pub visibility: RefCell<Vec<crate::nav::view::ContentVisibility>>,
    pub titles: RefCell<Vec<String>>,
    pub open_menus: RefCell<Vec<Option<String>>>,
    pub redirects: RefCell<Vec<String>>,
}

impl RecordingSurface {
    pub fn last_render(&self) -> crate::nav::view::NavView {
        self.renders.borrow().last().cloned().expect("nothing rendered")
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.borrow().clone()
    }
}

impl crate::nav::controller::NavSurface for RecordingSurface {
    fn render(&self, view: &crate::nav::view::NavView) {
        self.renders.borrow_mut().push(view.clone());
    }

    fn set_visibility(&self, visibility: crate::nav::view::ContentVisibility) {
        self.visibility.borrow_mut().push(visibility);
    }

    fn set_title(&self, title: &str) {
        self.titles.borrow_mut().push(title.to_owned());
    }

    fn set_open_menu(&self, menu: Option<&str>) {
        self.open_menus.borrow_mut().push(menu.map(str::to_owned));
    }

    fn redirect(&self, path: &str) {
        self.redirects.borrow_mut().push(path.to_owned());
    }
}
