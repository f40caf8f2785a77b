//! Page identity, route protection, and page titles.
//!
//! A page is identified by the last segment of the URL path with any file
//! extension removed; the site root is `index`.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use crate::util::location::{DASHBOARD_PATH, LANDING_PATH};

const INDEX_PAGE: &str = "index";

/// Pages that need a session.
const PROTECTED_PAGES: &[&str] = &[
    "dashboard",
    "profile",
    "offers",
    "deals",
    "wallet",
    "chat",
    "notifications",
    "calendar",
    "search",
    "collaborate",
    "admin",
    "settings",
];

/// Pages a signed-in user should not linger on.
const PUBLIC_ONLY_PAGES: &[&str] = &["index", "login", "register", "verify"];

const PAGE_TITLES: &[(&str, &str)] = &[
    ("index", "Welcome"),
    ("login", "Log In"),
    ("register", "Create Account"),
    ("verify", "Verify Account"),
    ("dashboard", "Dashboard"),
    ("profile", "Profile"),
    ("offers", "Offers"),
    ("deals", "Deals"),
    ("wallet", "Wallet"),
    ("chat", "Messages"),
    ("notifications", "Notifications"),
    ("calendar", "Calendar"),
    ("search", "Search"),
    ("collaborate", "Collaborate"),
    ("admin", "Admin"),
    ("settings", "Settings"),
];

pub const SITE_NAME: &str = "PartnerHub";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn from_path(path: &str) -> Self {
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let stem = match segment.rfind('.') {
            Some(dot) if dot > 0 => &segment[..dot],
            _ => segment,
        };
        if stem.is_empty() {
            Self(INDEX_PAGE.to_owned())
        } else {
            Self(stem.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_protected(&self) -> bool {
        PROTECTED_PAGES.contains(&self.as_str())
    }

    pub fn is_public_only(&self) -> bool {
        PUBLIC_ONLY_PAGES.contains(&self.as_str())
    }

    pub fn title(&self) -> Option<&'static str> {
        PAGE_TITLES
            .iter()
            .find(|(page, _)| *page == self.as_str())
            .map(|(_, title)| *title)
    }

    /// `<title> | PartnerHub`, or just the site name for unknown pages.
    pub fn document_title(&self) -> String {
        match self.title() {
            Some(title) => format!("{title} | {SITE_NAME}"),
            None => SITE_NAME.to_owned(),
        }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Stay,
    Redirect(&'static str),
}

/// Guests are bounced off protected pages; signed-in users are bounced off
/// public-only pages.
pub fn route_decision(page: &PageId, is_authenticated: bool) -> RouteDecision {
    if !is_authenticated && page.is_protected() {
        RouteDecision::Redirect(LANDING_PATH)
    } else if is_authenticated && page.is_public_only() {
        RouteDecision::Redirect(DASHBOARD_PATH)
    } else {
        RouteDecision::Stay
    }
}
