//! Page location: where we are and where to send the browser next.
//!
//! Redirects are full page navigations (`window.location.href = ...`), so a
//! fresh page load rebuilds every controller from scratch.

/// Route for signed-out visitors.
pub const LANDING_PATH: &str = "/";
/// Route for signed-in users landing on a public-only page.
pub const DASHBOARD_PATH: &str = "/dashboard";

pub trait Navigator {
    fn redirect(&self, path: &str);
}

/// Navigator driving `window.location`.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(feature = "hydrate")]
impl Navigator for BrowserNavigator {
    fn redirect(&self, path: &str) {
        log::info!("redirecting to {path}");
        if let Some(window) = web_sys::window() {
            if window.location().set_href(path).is_err() {
                log::warn!("failed to redirect to {path}");
            }
        }
    }
}

/// `window.location.pathname`, or `/` outside a browser.
pub fn current_pathname() -> String {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_owned())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        "/".to_owned()
    }
}

/// `window.location.hostname`, or `localhost` outside a browser.
pub fn current_hostname() -> String {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window()
            .and_then(|w| w.location().hostname().ok())
            .unwrap_or_else(|| "localhost".to_owned())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        "localhost".to_owned()
    }
}
