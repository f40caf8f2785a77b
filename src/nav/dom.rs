//! DOM-backed navigation surface. Requires a browser environment.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page shell provides a `.nav-actions` container; `NavActions` is
//! mounted into it once and redrawn from signals. Content tagged with
//! `data-auth="true"|"false"` is shown or hidden directly.

use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;

use super::controller::{NavHandle, NavSurface};
use super::view::{ContentVisibility, NavView};
use crate::components::nav_actions::NavActions;
use crate::util::location::{BrowserNavigator, Navigator as _};

const NAV_ACTIONS_SELECTOR: &str = ".nav-actions";
const DATA_AUTH_SELECTOR: &str = "[data-auth]";
const DROPDOWN_SELECTOR: &str = ".nav-dropdown";

type ClickListener = Closure<dyn FnMut(web_sys::Event)>;

pub struct DomSurface {
    view: RwSignal<NavView>,
    open_menu: RwSignal<Option<String>>,
    handle: RefCell<Option<NavHandle>>,
    outside_click: RefCell<Option<ClickListener>>,
}

impl Default for DomSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSurface {
    pub fn new() -> Self {
        Self {
            view: RwSignal::new(NavView::default()),
            open_menu: RwSignal::new(None),
            handle: RefCell::new(None),
            outside_click: RefCell::new(None),
        }
    }

    /// Mount the nav actions component into `.nav-actions`.
    ///
    /// Returns `false` when the page has no such container; the surface then
    /// still manages titles, visibility, and redirects.
    pub fn mount(&self, handle: NavHandle) -> bool {
        *self.handle.borrow_mut() = Some(handle.clone());

        let Some(container) = document()
            .query_selector(NAV_ACTIONS_SELECTOR)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        else {
            log::warn!("no {NAV_ACTIONS_SELECTOR} container on this page");
            return false;
        };
        container.set_inner_html("");

        let nav = self.view;
        let open_menu = self.open_menu;
        let actions = StoredValue::new_local(handle);
        leptos::mount::mount_to(container, move || {
            view! { <NavActions nav=nav open_menu=open_menu actions=actions/> }
        })
        .forget();
        true
    }

    fn arm_outside_click(&self) {
        if self.outside_click.borrow().is_some() {
            return;
        }
        let Some(handle) = self.handle.borrow().clone() else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };

        let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if click_inside_dropdown(&event) {
                return;
            }
            // Closing removes (and drops) this very closure, so defer it
            // until the current dispatch has returned.
            let handle = handle.clone();
            wasm_bindgen_futures::spawn_local(async move {
                handle.outside_click();
            });
        }) as Box<dyn FnMut(web_sys::Event)>);

        if window
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .is_ok()
        {
            *self.outside_click.borrow_mut() = Some(listener);
        }
    }

    fn disarm_outside_click(&self) {
        let Some(listener) = self.outside_click.borrow_mut().take() else {
            return;
        };
        if let Some(window) = web_sys::window() {
            let _ = window
                .remove_event_listener_with_callback("click", listener.as_ref().unchecked_ref());
        }
    }
}

impl NavSurface for DomSurface {
    fn render(&self, view: &NavView) {
        self.view.set(view.clone());
    }

    fn set_visibility(&self, visibility: ContentVisibility) {
        let Ok(nodes) = document().query_selector_all(DATA_AUTH_SELECTOR) else {
            return;
        };
        for index in 0..nodes.length() {
            let Some(el) = nodes
                .item(index)
                .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
            else {
                continue;
            };
            let Some(shown) = el
                .get_attribute("data-auth")
                .and_then(|value| visibility.shows(&value))
            else {
                continue;
            };
            let style = el.style();
            let _ = if shown {
                style.remove_property("display").map(|_| ())
            } else {
                style.set_property("display", "none")
            };
        }
    }

    fn set_title(&self, title: &str) {
        document().set_title(title);
    }

    fn set_open_menu(&self, menu: Option<&str>) {
        self.open_menu.set(menu.map(str::to_owned));
        if menu.is_some() {
            self.arm_outside_click();
        } else {
            self.disarm_outside_click();
        }
    }

    fn redirect(&self, path: &str) {
        BrowserNavigator.redirect(path);
    }
}

fn click_inside_dropdown(event: &web_sys::Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
        .and_then(|el| el.closest(DROPDOWN_SELECTOR).ok().flatten())
        .is_some()
}
