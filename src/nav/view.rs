//! Navigation view-model: what the nav actions region should show for a
//! given session, independent of how it gets drawn.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use crate::state::auth::{AuthSnapshot, SessionUser, UserRole};

const FALLBACK_NAME: &str = "User";

/// Dropdown id for the signed-in user's menu.
pub const USER_MENU: &str = "user-menu";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl NavLink {
    const fn new(label: &'static str, href: &'static str) -> Self {
        Self { label, href }
    }
}

const LOGIN_LINK: NavLink = NavLink::new("Log In", "/login");
const SIGN_UP_LINK: NavLink = NavLink::new("Sign Up", "/register");
const DASHBOARD_LINK: NavLink = NavLink::new("Dashboard", "/dashboard");
const MESSAGES_LINK: NavLink = NavLink::new("Messages", "/chat");

impl UserRole {
    /// The one role-specific entry in the nav bar.
    pub fn nav_link(self) -> NavLink {
        match self {
            Self::Marketer => NavLink::new("Offers", "/offers"),
            Self::Creator => NavLink::new("Deals", "/deals"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(&'static str),
    Logout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

const USER_MENU_ITEMS: [MenuItem; 4] = [
    MenuItem { label: "Profile", action: MenuAction::Navigate("/profile") },
    MenuItem { label: "Wallet", action: MenuAction::Navigate("/wallet") },
    MenuItem { label: "Settings", action: MenuAction::Navigate("/settings") },
    MenuItem { label: "Log Out", action: MenuAction::Logout },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserNav {
    pub role: UserRole,
    pub initial: String,
    pub display_name: String,
    pub links: Vec<NavLink>,
    pub menu: Vec<MenuItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavView {
    Guest { links: Vec<NavLink> },
    Authenticated(UserNav),
}

impl Default for NavView {
    fn default() -> Self {
        Self::Guest { links: vec![LOGIN_LINK, SIGN_UP_LINK] }
    }
}

impl NavView {
    pub fn for_session(snapshot: &AuthSnapshot) -> Self {
        if !snapshot.is_authenticated {
            return Self::default();
        }
        let fallback = SessionUser::default();
        let user = snapshot.user.as_ref().unwrap_or(&fallback);
        let role = user.role();
        let display_name = display_name(user);
        Self::Authenticated(UserNav {
            role,
            initial: avatar_initial(&display_name),
            display_name,
            links: vec![DASHBOARD_LINK, role.nav_link(), MESSAGES_LINK],
            menu: USER_MENU_ITEMS.to_vec(),
        })
    }

    pub fn links(&self) -> &[NavLink] {
        match self {
            Self::Guest { links } => links,
            Self::Authenticated(user) => &user.links,
        }
    }

    pub fn has_link(&self, label: &str) -> bool {
        self.links().iter().any(|link| link.label == label)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Which `data-auth` tagged elements are visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentVisibility {
    /// Elements tagged `data-auth="true"`.
    pub authenticated: bool,
    /// Elements tagged `data-auth="false"`.
    pub guest: bool,
}

impl ContentVisibility {
    pub fn for_session(is_authenticated: bool) -> Self {
        Self { authenticated: is_authenticated, guest: !is_authenticated }
    }

    /// Visibility for an element carrying `data-auth=<value>`; `None` for
    /// values the page does not toggle.
    pub fn shows(self, data_auth: &str) -> Option<bool> {
        match data_auth {
            "true" => Some(self.authenticated),
            "false" => Some(self.guest),
            _ => None,
        }
    }
}

/// `name`, then `userName`, then a name guessed from the email, then "User".
pub fn display_name(user: &SessionUser) -> String {
    [user.name.as_deref(), user.user_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_owned)
        .or_else(|| user.email.as_deref().and_then(name_from_email))
        .unwrap_or_else(|| FALLBACK_NAME.to_owned())
}

/// `jane.doe+promo@x.io` -> `Jane Doe Promo`.
pub fn name_from_email(email: &str) -> Option<String> {
    let (local, _) = email.split_once('@')?;
    let words: Vec<String> = local
        .split(['.', '_', '-', '+'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() { None } else { Some(words.join(" ")) }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn avatar_initial(display_name: &str) -> String {
    display_name
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .map_or_else(String::new, String::from)
}
