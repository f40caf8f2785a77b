//! Page bootstrap: wires the API client, auth store, and navigation
//! controller for one page load. Requires a browser environment.

use std::rc::Rc;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;

use crate::nav::controller::NavController;
use crate::nav::dom::DomSurface;
use crate::net::api::{ApiClient, ApiConfig};
use crate::net::loading::LoadingRegistry;
use crate::net::transport::GlooTransport;
use crate::state::auth::AuthStore;
use crate::state::session::{restore_session, sign_out};
use crate::util::events::forward_loading_events;
use crate::util::location::{BrowserNavigator, current_hostname, current_pathname};
use crate::util::storage::LocalStorageTokenStore;

/// Everything one page owns. Lives until the next full navigation.
pub struct App {
    pub api: Rc<ApiClient<GlooTransport>>,
    pub auth: AuthStore,
    pub nav: NavController,
    pub surface: Rc<DomSurface>,
}

impl App {
    fn new() -> Self {
        let loading = LoadingRegistry::new();
        forward_loading_events(&loading);

        let api = Rc::new(ApiClient::new(
            GlooTransport,
            ApiConfig::for_hostname(&current_hostname()),
            Rc::new(LocalStorageTokenStore),
            Rc::new(BrowserNavigator),
            loading,
        ));
        let auth = AuthStore::default();

        let surface = Rc::new(DomSurface::new());
        let nav = NavController::new(&current_pathname(), surface.clone());
        surface.mount(nav.handle());

        {
            let api = Rc::clone(&api);
            nav.on_logout(move || {
                let api = Rc::clone(&api);
                wasm_bindgen_futures::spawn_local(async move {
                    sign_out(&api, auth).await;
                });
            });
        }

        Self { api, auth, nav, surface }
    }
}

/// WASM entry point.
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    when_dom_ready(boot);
}

fn boot() {
    let app: &'static App = Box::leak(Box::new(App::new()));
    log::info!("page '{}' booted", app.nav.page());

    // Attach only once the session is known so a stale token does not
    // trigger a redirect before it has been checked.
    wasm_bindgen_futures::spawn_local(async move {
        restore_session(&app.api, app.auth).await;
        app.nav.attach(app.auth);
    });
}

fn when_dom_ready(init: fn()) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let ready_state = js_sys::Reflect::get(&document, &"readyState".into())
        .ok()
        .and_then(|state| state.as_string());
    if ready_state.as_deref() != Some("loading") {
        init();
        return;
    }
    let callback = Closure::once_into_js(init);
    if document
        .add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        .is_err()
    {
        log::warn!("could not defer startup; initializing now");
        init();
    }
}
