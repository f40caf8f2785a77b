//! Navigation controller: keeps the nav chrome and route access in step
//! with the auth session.
//!
//! SYSTEM CONTEXT
//! ==============
//! One controller per page load. An effect reads the `AuthStore` signal and,
//! on every snapshot, re-renders the nav actions, toggles `data-auth` content,
//! sets the document title, and enforces route protection. Protection runs
//! on every update, so a session that expires mid-visit is bounced on the
//! next notification rather than the next page load.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::{Get, ImmediateEffect, untrack};
use send_wrapper::SendWrapper;

use super::dropdown::{DropdownChange, DropdownState};
use super::page::{PageId, RouteDecision, route_decision};
use super::view::{ContentVisibility, NavView};
use crate::state::auth::{AuthSnapshot, AuthStore};

/// Where navigation updates land: the DOM in the browser, a recorder in tests.
pub trait NavSurface {
    fn render(&self, view: &NavView);
    fn set_visibility(&self, visibility: ContentVisibility);
    fn set_title(&self, title: &str);
    /// Show `menu` as the open dropdown (or none). The outside-click
    /// listener should be armed exactly while a menu is shown.
    fn set_open_menu(&self, menu: Option<&str>);
    fn redirect(&self, path: &str);
}

/// Everything one auth snapshot implies for the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavUpdate {
    pub view: NavView,
    pub visibility: ContentVisibility,
    pub title: String,
    pub route: RouteDecision,
}

impl NavUpdate {
    pub fn plan(page: &PageId, snapshot: &AuthSnapshot) -> Self {
        Self {
            view: NavView::for_session(snapshot),
            visibility: ContentVisibility::for_session(snapshot.is_authenticated),
            title: page.document_title(),
            route: route_decision(page, snapshot.is_authenticated),
        }
    }
}

type LogoutHook = Rc<dyn Fn()>;

struct NavInner {
    page: PageId,
    surface: Rc<dyn NavSurface>,
    dropdown: RefCell<DropdownState>,
    on_logout: RefCell<Option<LogoutHook>>,
}

impl NavInner {
    fn apply(&self, snapshot: &AuthSnapshot) -> NavUpdate {
        let update = NavUpdate::plan(&self.page, snapshot);
        if !update.view.is_authenticated() {
            self.close_menus();
        }
        self.surface.render(&update.view);
        self.surface.set_visibility(update.visibility);
        self.surface.set_title(&update.title);
        if let RouteDecision::Redirect(path) = update.route {
            log::info!(
                "page '{}' not available when authenticated={}, redirecting",
                self.page,
                snapshot.is_authenticated
            );
            self.surface.redirect(path);
        }
        update
    }

    fn sync_menu(&self, change: DropdownChange) -> DropdownChange {
        if !change.is_empty() {
            let open = self.dropdown.borrow().open_menu().map(str::to_owned);
            self.surface.set_open_menu(open.as_deref());
        }
        change
    }

    fn toggle_menu(&self, menu: &str) -> DropdownChange {
        let change = self.dropdown.borrow_mut().toggle(menu);
        self.sync_menu(change)
    }

    fn close_menus(&self) -> DropdownChange {
        let change = self.dropdown.borrow_mut().close_all();
        self.sync_menu(change)
    }

    fn outside_click(&self) -> DropdownChange {
        let change = self.dropdown.borrow_mut().outside_click();
        self.sync_menu(change)
    }

    fn logout(&self) {
        self.close_menus();
        let hook = self.on_logout.borrow().clone();
        match hook {
            Some(hook) => hook(),
            None => log::warn!("logout requested but no handler installed"),
        }
    }
}

/// Non-owning handle for the rendered view to report user interaction.
///
/// Calls after the controller is gone are ignored.
#[derive(Clone)]
pub struct NavHandle(Weak<NavInner>);

impl NavHandle {
    pub fn toggle_menu(&self, menu: &str) -> DropdownChange {
        self.0
            .upgrade()
            .map(|inner| inner.toggle_menu(menu))
            .unwrap_or_default()
    }

    pub fn outside_click(&self) -> DropdownChange {
        self.0
            .upgrade()
            .map(|inner| inner.outside_click())
            .unwrap_or_default()
    }

    pub fn logout(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.logout();
        }
    }
}

pub struct NavController {
    inner: Rc<NavInner>,
    effect: RefCell<Option<ImmediateEffect>>,
}

impl std::fmt::Debug for NavController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavController")
            .field("page", &self.inner.page)
            .field("dropdown", &self.inner.dropdown.borrow())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

impl NavController {
    /// `path` is the URL pathname; the page id is fixed for the controller's
    /// lifetime.
    pub fn new(path: &str, surface: Rc<dyn NavSurface>) -> Self {
        Self {
            inner: Rc::new(NavInner {
                page: PageId::from_path(path),
                surface,
                dropdown: RefCell::new(DropdownState::default()),
                on_logout: RefCell::new(None),
            }),
            effect: RefCell::new(None),
        }
    }

    pub fn page(&self) -> &PageId {
        &self.inner.page
    }

    pub fn handle(&self) -> NavHandle {
        NavHandle(Rc::downgrade(&self.inner))
    }

    /// Run `hook` when the user picks "Log Out" from the menu.
    pub fn on_logout(&self, hook: impl Fn() + 'static) {
        *self.inner.on_logout.borrow_mut() = Some(Rc::new(hook));
    }

    /// Track `store` with an effect; its first run applies the current
    /// snapshot. Re-attaching drops any earlier effect first.
    pub fn attach(&self, store: AuthStore) -> NavUpdate {
        self.destroy();
        let signal = store.signal();
        // Effects must be Send; the controller only lives on the UI thread.
        let weak = SendWrapper::new(Rc::downgrade(&self.inner));
        let effect = ImmediateEffect::new_isomorphic(move || {
            let snapshot = signal.get();
            if let Some(inner) = weak.upgrade() {
                untrack(|| inner.apply(&snapshot));
            }
        });
        *self.effect.borrow_mut() = Some(effect);
        NavUpdate::plan(&self.inner.page, &store.snapshot())
    }

    pub fn is_attached(&self) -> bool {
        self.effect.borrow().is_some()
    }

    pub fn apply(&self, snapshot: &AuthSnapshot) -> NavUpdate {
        self.inner.apply(snapshot)
    }

    pub fn dropdown(&self) -> DropdownState {
        self.inner.dropdown.borrow().clone()
    }

    pub fn toggle_menu(&self, menu: &str) -> DropdownChange {
        self.inner.toggle_menu(menu)
    }

    pub fn outside_click(&self) -> DropdownChange {
        self.inner.outside_click()
    }

    /// Stop tracking the auth store. Safe to call repeatedly.
    pub fn destroy(&self) {
        // Dropping the effect unsubscribes it from the signal.
        let effect = self.effect.borrow_mut().take();
        drop(effect);
    }
}

impl Drop for NavController {
    fn drop(&mut self) {
        self.destroy();
    }
}
