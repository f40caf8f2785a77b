//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthStore` wraps an `RwSignal<AuthSnapshot>`. The navigation controller
//! reads it from an effect, so route guards re-run whenever the session
//! changes.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account kind. Brands sign up as marketers; everyone else is a creator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Marketer,
    #[default]
    Creator,
}

impl UserRole {
    /// Unknown or missing `userType` values are treated as creators.
    pub fn from_user_type(user_type: Option<&str>) -> Self {
        match user_type {
            Some(kind) if kind.eq_ignore_ascii_case("marketer") => Self::Marketer,
            _ => Self::Creator,
        }
    }
}

/// Signed-in user as reported by the platform API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Backends send either a string or a numeric id.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    /// `"marketer"` or `"creator"`.
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl SessionUser {
    pub fn role(&self) -> UserRole {
        UserRole::from_user_type(self.user_type.as_deref())
    }

    /// Accepts either `{ "user": { .. } }` or a bare user object. Objects
    /// carrying none of the user fields (e.g. `{ "token": .. }`) are not users.
    pub fn from_response(body: &Value) -> Option<Self> {
        const USER_FIELDS: [&str; 6] = ["id", "userType", "name", "userName", "email", "phone"];
        let candidate = body.get("user").unwrap_or(body).as_object()?;
        if !USER_FIELDS.iter().any(|field| candidate.contains_key(*field)) {
            return None;
        }
        match serde_json::from_value(Value::Object(candidate.clone())) {
            Ok(user) => Some(user),
            Err(err) => {
                log::warn!("ignoring malformed user in response: {err}");
                None
            }
        }
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(_) => Err(D::Error::custom("expected string or numeric id")),
    }
}

/// Read-only view of the session handed to subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub user: Option<SessionUser>,
}

impl AuthSnapshot {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self { is_authenticated: true, user: Some(user) }
    }
}

/// Page-wide auth state. Copies share the same signal.
///
/// Reading through `signal()` inside an effect subscribes that effect to
/// every later `set`.
#[derive(Clone, Copy, Debug)]
pub struct AuthStore {
    snapshot: RwSignal<AuthSnapshot>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new(AuthSnapshot::guest())
    }
}

impl AuthStore {
    pub fn new(initial: AuthSnapshot) -> Self {
        Self { snapshot: RwSignal::new(initial) }
    }

    /// Current snapshot, without tracking.
    pub fn snapshot(self) -> AuthSnapshot {
        self.snapshot.get_untracked()
    }

    pub fn signal(self) -> RwSignal<AuthSnapshot> {
        self.snapshot
    }

    /// Replace the snapshot; effects reading the signal re-run.
    pub fn set(self, snapshot: AuthSnapshot) {
        self.snapshot.set(snapshot);
    }
}
