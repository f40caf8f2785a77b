//! Request payloads for the auth endpoints.
//!
//! Other domain calls accept any `Serialize` payload; their bodies are owned
//! by the pages that build them.

use serde::Serialize;

use crate::state::auth::UserRole;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// First step of OTP registration. Exactly one of `email`/`phone` is
/// normally set; the server decides where the code goes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
    pub user_type: UserRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyOtpRequest {
    /// Email address or phone number the code was sent to.
    pub contact: String,
    pub otp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResendOtpRequest {
    pub contact: String,
}
