//! REST API client for the PartnerHub backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every backend call goes through `ApiClient::request`, which owns the
//! bearer token, the retry loop, and the loading registry entry for the
//! endpoint. Domain helpers below are thin wrappers that fix the path,
//! method, and body shape.
//!
//! ERROR HANDLING
//! ==============
//! A 401 is terminal: the token is dropped and the page is sent to the
//! landing route before `ApiError::Unauthorized` is returned. Retryable
//! statuses and connectivity failures are retried with exponential backoff;
//! everything else surfaces immediately.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, request_failed_message};
use super::loading::LoadingRegistry;
use super::retry::{Attempt, RetryDecision, RetryPolicy};
use super::transport::{FormPayload, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use super::types::{LoginRequest, RegisterRequest, ResendOtpRequest, VerifyOtpRequest};
use crate::util::location::{LANDING_PATH, Navigator};
use crate::util::storage::TokenStore;

/// API root used when the page is served from a local dev host.
pub const DEV_API_BASE: &str = "http://localhost:3000/api";
/// API root in every other environment (same origin).
pub const API_BASE: &str = "/api";

/// Where requests go and how hard to retry them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: API_BASE.to_owned(), retry: RetryPolicy::default() }
    }
}

impl ApiConfig {
    /// Pick the base URL for the hostname the page was loaded from.
    pub fn for_hostname(hostname: &str) -> Self {
        let base_url = if is_local_host(hostname) { DEV_API_BASE } else { API_BASE };
        Self { base_url: base_url.to_owned(), ..Self::default() }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Non-empty `token` field of an auth response.
pub fn issued_token(body: &Value) -> Option<&str> {
    body.get("token").and_then(Value::as_str).filter(|token| !token.is_empty())
}

fn is_local_host(hostname: &str) -> bool {
    matches!(hostname, "localhost" | "127.0.0.1")
}

/// Method, extra headers, and body for one call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self { method: Method::Delete, ..Self::default() }
    }

    /// Body-less call with an explicit method.
    pub fn method(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    /// # Errors
    ///
    /// Returns `ApiError::Encode` if `payload` cannot be serialized.
    pub fn json(method: Method, payload: &impl Serialize) -> Result<Self, ApiError> {
        let text = serde_json::to_string(payload).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(Self { method, headers: Vec::new(), body: RequestBody::Json(text) })
    }

    /// Multipart POST.
    pub fn form(form: FormPayload) -> Self {
        Self { method: Method::Post, headers: Vec::new(), body: RequestBody::Form(form) }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The platform API client. One instance per page, shared by `Rc`.
pub struct ApiClient<T> {
    transport: T,
    config: ApiConfig,
    token: RefCell<Option<String>>,
    store: Rc<dyn TokenStore>,
    navigator: Rc<dyn Navigator>,
    loading: LoadingRegistry,
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("authenticated", &self.token.borrow().is_some())
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build a client, restoring any token persisted by a previous session.
    pub fn new(
        transport: T,
        config: ApiConfig,
        store: Rc<dyn TokenStore>,
        navigator: Rc<dyn Navigator>,
        loading: LoadingRegistry,
    ) -> Self {
        let token = store.load();
        Self { transport, config, token: RefCell::new(token), store, navigator, loading }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn loading(&self) -> &LoadingRegistry {
        &self.loading
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // Token lifecycle
    // =========================================================================

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn set_token(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_owned());
        self.store.save(token);
    }

    pub fn clear_token(&self) {
        self.token.borrow_mut().take();
        self.store.clear();
    }

    /// Store `body.token` when the server returned one.
    fn capture_token(&self, body: &Value) {
        if let Some(token) = issued_token(body) {
            self.set_token(token);
        }
    }

    // =========================================================================
    // Core request
    // =========================================================================

    fn build_request(&self, endpoint: &str, options: RequestOptions) -> HttpRequest {
        let mut headers: Vec<(String, String)> = Vec::new();
        if !options.body.is_form() {
            headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
        }
        for (name, value) in options.headers {
            set_header(&mut headers, name, value);
        }
        if let Some(token) = self.token.borrow().as_deref() {
            set_header(&mut headers, "Authorization".to_owned(), format!("Bearer {token}"));
        }
        HttpRequest {
            method: options.method,
            url: format!("{}{endpoint}", self.config.base_url),
            headers,
            body: options.body,
        }
    }

    /// Send one API call, retrying transient failures.
    ///
    /// The endpoint is reported as loading from the first attempt until this
    /// returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// See `ApiError` for the failure kinds.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let _loading = self.loading.begin(endpoint);
        let request = self.build_request(endpoint, options);
        let policy = &self.config.retry;
        let mut retry_count = 0;

        loop {
            log::debug!(
                "{} {} (attempt {})",
                request.method.as_str(),
                request.url,
                retry_count + 1
            );
            let delay = match self.transport.send(&request).await {
                Ok(response) if response.status == 401 => {
                    log::warn!("{endpoint}: unauthorized, clearing session");
                    self.clear_token();
                    self.navigator.redirect(LANDING_PATH);
                    return Err(ApiError::Unauthorized);
                }
                Ok(response) => match policy.decide(Attempt::Status(response.status), retry_count) {
                    RetryDecision::Retry(delay) => {
                        log::warn!(
                            "{endpoint}: status {}, retrying in {}ms",
                            response.status,
                            delay.as_millis()
                        );
                        delay
                    }
                    RetryDecision::Stop => return decode_response(policy, response),
                },
                Err(err) if err.is_network() => match policy.decide(Attempt::NetworkFailure, retry_count) {
                    RetryDecision::Retry(delay) => {
                        log::warn!("{endpoint}: {err}, retrying in {}ms", delay.as_millis());
                        delay
                    }
                    RetryDecision::Stop => return Err(err.into()),
                },
                Err(err) => return Err(err.into()),
            };
            self.transport.sleep(delay).await;
            retry_count += 1;
        }
    }

    async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    async fn send_json(&self, method: Method, endpoint: &str, payload: &impl Serialize) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::json(method, payload)?).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Value, ApiError> {
        let body = self.send_json(Method::Post, "/auth/login", credentials).await?;
        self.capture_token(&body);
        Ok(body)
    }

    /// Start OTP registration; the server sends a code to the contact.
    ///
    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn register_start(&self, registration: &RegisterRequest) -> Result<Value, ApiError> {
        self.send_json(Method::Post, "/auth/register", registration).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn register_verify(&self, verification: &VerifyOtpRequest) -> Result<Value, ApiError> {
        let body = self.send_json(Method::Post, "/auth/verify-otp", verification).await?;
        self.capture_token(&body);
        Ok(body)
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn resend_otp(&self, resend: &ResendOtpRequest) -> Result<Value, ApiError> {
        self.send_json(Method::Post, "/auth/resend-otp", resend).await
    }

    /// Best-effort server logout; the local token is cleared regardless.
    pub async fn logout(&self) {
        if let Err(err) = self.request("/auth/logout", RequestOptions::method(Method::Post)).await {
            log::warn!("server logout failed: {err}");
        }
        self.clear_token();
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn current_user(&self) -> Result<Value, ApiError> {
        self.get("/auth/me").await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn get_profile(&self) -> Result<Value, ApiError> {
        self.get("/users/profile").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn update_profile(&self, profile: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Put, "/users/profile", profile).await
    }

    // =========================================================================
    // Offers
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn list_offers(&self) -> Result<Value, ApiError> {
        self.get("/offers").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn get_offer(&self, offer_id: &str) -> Result<Value, ApiError> {
        self.get(&offer_endpoint(offer_id, "")).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn create_offer(&self, offer: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Post, "/offers", offer).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn update_offer(&self, offer_id: &str, offer: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Put, &offer_endpoint(offer_id, ""), offer).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn delete_offer(&self, offer_id: &str) -> Result<Value, ApiError> {
        self.request(&offer_endpoint(offer_id, ""), RequestOptions::delete()).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn accept_offer(&self, offer_id: &str) -> Result<Value, ApiError> {
        self.request(&offer_endpoint(offer_id, "/accept"), RequestOptions::method(Method::Post))
            .await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn reject_offer(&self, offer_id: &str, reason: Option<&str>) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "reason": reason });
        self.send_json(Method::Post, &offer_endpoint(offer_id, "/reject"), &payload)
            .await
    }

    /// Counter-propose new terms on an offer.
    ///
    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn counter_offer(&self, offer_id: &str, terms: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Post, &offer_endpoint(offer_id, "/counter"), terms)
            .await
    }

    /// Open a collaborative-editing session for a deal's content brief.
    ///
    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn start_collaboration_session(&self, deal_id: &str) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "dealId": deal_id });
        self.send_json(Method::Post, "/collaboration/sessions", &payload).await
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn payment_methods(&self) -> Result<Value, ApiError> {
        self.get("/payments/methods").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn add_payment_method(&self, method: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Post, "/payments/methods", method).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn remove_payment_method(&self, method_id: &str) -> Result<Value, ApiError> {
        let endpoint = format!("/payments/methods/{}", urlencoding::encode(method_id));
        self.request(&endpoint, RequestOptions::delete()).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn wallet(&self) -> Result<Value, ApiError> {
        self.get("/payments/wallet").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn withdraw(&self, amount_cents: u64, method_id: &str) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "amount": amount_cents, "methodId": method_id });
        self.send_json(Method::Post, "/payments/withdraw", &payload).await
    }

    // =========================================================================
    // Deals
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn list_deals(&self) -> Result<Value, ApiError> {
        self.get("/deals").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn get_deal(&self, deal_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/deals/{}", urlencoding::encode(deal_id))).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn update_deal(&self, deal_id: &str, update: &impl Serialize) -> Result<Value, ApiError> {
        let endpoint = format!("/deals/{}", urlencoding::encode(deal_id));
        self.send_json(Method::Put, &endpoint, update).await
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Upload one file as multipart form data.
    ///
    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ApiError> {
        let form = FormPayload::new().file("file", filename, content_type, bytes);
        self.request("/files/upload", RequestOptions::form(form)).await
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn conversations(&self) -> Result<Value, ApiError> {
        self.get("/chat/conversations").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn messages(&self, conversation_id: &str) -> Result<Value, ApiError> {
        self.get(&conversation_messages_endpoint(conversation_id)).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "content": content });
        self.send_json(Method::Post, &conversation_messages_endpoint(conversation_id), &payload)
            .await
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn notifications(&self) -> Result<Value, ApiError> {
        self.get("/notifications").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<Value, ApiError> {
        let endpoint = format!("/notifications/{}/read", urlencoding::encode(notification_id));
        self.request(&endpoint, RequestOptions::method(Method::Put)).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn mark_all_notifications_read(&self) -> Result<Value, ApiError> {
        self.request("/notifications/read-all", RequestOptions::method(Method::Put))
            .await
    }

    // =========================================================================
    // Calendar
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn calendar_events(&self) -> Result<Value, ApiError> {
        self.get("/calendar/events").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn create_calendar_event(&self, event: &impl Serialize) -> Result<Value, ApiError> {
        self.send_json(Method::Post, "/calendar/events", event).await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Full-text search, optionally narrowed to one result kind.
    ///
    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn search(&self, query: &str, kind: Option<&str>) -> Result<Value, ApiError> {
        self.get(&search_endpoint(query, kind)).await
    }

    // =========================================================================
    // QR codes
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn generate_qr_code(&self, target: &str) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "data": target });
        self.send_json(Method::Post, "/qr/generate", &payload).await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn scan_qr_code(&self, code: &str) -> Result<Value, ApiError> {
        let payload = serde_json::json!({ "code": code });
        self.send_json(Method::Post, "/qr/scan", &payload).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn admin_dashboard(&self) -> Result<Value, ApiError> {
        self.get("/admin/dashboard").await
    }

    /// # Errors
    ///
    /// Propagates `request` failures.
    pub async fn admin_users(&self, page: u32) -> Result<Value, ApiError> {
        self.get(&format!("/admin/users?page={page}")).await
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
    headers.push((name, value));
}

fn offer_endpoint(offer_id: &str, action: &str) -> String {
    format!("/offers/{}{action}", urlencoding::encode(offer_id))
}

fn conversation_messages_endpoint(conversation_id: &str) -> String {
    format!("/chat/conversations/{}/messages", urlencoding::encode(conversation_id))
}

fn search_endpoint(query: &str, kind: Option<&str>) -> String {
    let mut endpoint = format!("/search?q={}", urlencoding::encode(query));
    if let Some(kind) = kind {
        endpoint.push_str("&type=");
        endpoint.push_str(&urlencoding::encode(kind));
    }
    endpoint
}

/// Prefer the server's own wording: `message`, then `error`.
fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

fn decode_response(policy: &RetryPolicy, response: HttpResponse) -> Result<Value, ApiError> {
    let parsed = if response.body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(&response.body)
    };

    if response.is_success() {
        return parsed.map_err(|e| ApiError::Decode(e.to_string()));
    }

    let status = response.status;
    let message = parsed
        .ok()
        .as_ref()
        .and_then(server_message)
        .unwrap_or_else(|| request_failed_message(status));
    if policy.is_retryable_status(status) {
        Err(ApiError::Server { status, message })
    } else {
        Err(ApiError::Application { status, message })
    }
}
