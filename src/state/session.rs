//! Session flows that move the `AuthStore` in step with the API client.
//!
//! The API client owns the token; the store owns what the UI believes.
//! These helpers are the only places that update both.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde_json::Value;

use super::auth::{AuthSnapshot, AuthStore, SessionUser};
use crate::net::api::{ApiClient, issued_token};
use crate::net::error::ApiError;
use crate::net::transport::Transport;
use crate::net::types::{LoginRequest, VerifyOtpRequest};

/// Snapshot for a token we hold but could not resolve to a user.
fn token_only() -> AuthSnapshot {
    AuthSnapshot { is_authenticated: true, user: None }
}

/// Snapshot after an auth response. Only a response that issued a token
/// changes the session; a token held from earlier does not count.
fn snapshot_after_auth(body: &Value) -> Option<AuthSnapshot> {
    issued_token(body)?;
    Some(SessionUser::from_response(body).map_or_else(token_only, AuthSnapshot::authenticated))
}

/// Resolve a persisted token into a session on page load.
///
/// No token means guest. A rejected token (401) also means guest; the
/// client has already cleared it. Other failures keep the token and report
/// an authenticated session without user details.
pub async fn restore_session<T: Transport>(api: &ApiClient<T>, auth: AuthStore) -> AuthSnapshot {
    let snapshot = if api.is_authenticated() {
        match api.current_user().await {
            Ok(body) => SessionUser::from_response(&body).map_or_else(token_only, AuthSnapshot::authenticated),
            Err(ApiError::Unauthorized) => AuthSnapshot::guest(),
            Err(err) => {
                log::warn!("could not load current user: {err}");
                token_only()
            }
        }
    } else {
        AuthSnapshot::guest()
    };
    auth.set(snapshot.clone());
    snapshot
}

/// Password login. The store is only updated when the server issued a token.
///
/// # Errors
///
/// Propagates the login request failure.
pub async fn sign_in<T: Transport>(
    api: &ApiClient<T>,
    auth: AuthStore,
    credentials: &LoginRequest,
) -> Result<AuthSnapshot, ApiError> {
    let body = api.login(credentials).await?;
    Ok(publish(auth, snapshot_after_auth(&body)))
}

/// Final OTP step of registration.
///
/// # Errors
///
/// Propagates the verification request failure.
pub async fn verify_registration<T: Transport>(
    api: &ApiClient<T>,
    auth: AuthStore,
    verification: &VerifyOtpRequest,
) -> Result<AuthSnapshot, ApiError> {
    let body = api.register_verify(verification).await?;
    Ok(publish(auth, snapshot_after_auth(&body)))
}

pub async fn sign_out<T: Transport>(api: &ApiClient<T>, auth: AuthStore) {
    api.logout().await;
    auth.set(AuthSnapshot::guest());
}

fn publish(auth: AuthStore, snapshot: Option<AuthSnapshot>) -> AuthSnapshot {
    match snapshot {
        Some(snapshot) => {
            auth.set(snapshot.clone());
            snapshot
        }
        None => auth.snapshot(),
    }
}
