//! Bearer-token persistence.
//!
//! The browser build keeps the token in `localStorage` so sessions survive
//! reloads. Requires a browser environment; `MemoryTokenStore` is used
//! everywhere else.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;

/// `localStorage` key holding the bearer token.
pub const TOKEN_STORAGE_KEY: &str = "partnerhub_auth_token";

pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// In-memory store for non-browser builds and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RefCell::new(Some(token.into())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn save(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_owned());
    }

    fn clear(&self) {
        self.token.borrow_mut().take();
    }
}

/// Token store backed by `window.localStorage`.
///
/// Storage failures (private mode, quota, disabled storage) are logged and
/// otherwise ignored; the in-memory copy in `ApiClient` keeps working.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageTokenStore;

#[cfg(feature = "hydrate")]
impl LocalStorageTokenStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(feature = "hydrate")]
impl TokenStore for LocalStorageTokenStore {
    fn load(&self) -> Option<String> {
        Self::storage()?
            .get_item(TOKEN_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
    }

    fn save(&self, token: &str) {
        let Some(storage) = Self::storage() else {
            log::warn!("localStorage unavailable; token kept in memory only");
            return;
        };
        if storage.set_item(TOKEN_STORAGE_KEY, token).is_err() {
            log::warn!("failed to persist auth token");
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(TOKEN_STORAGE_KEY);
        }
    }
}
