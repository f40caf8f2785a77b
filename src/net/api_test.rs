use super::*;
use crate::net::loading::LoadingChange;
use crate::net::transport::TransportError;
use crate::testing::{ScriptedTransport, TestClient, test_client, test_client_with_store};
use crate::util::storage::MemoryTokenStore;
use futures::executor::block_on;
use std::time::Duration;

fn ok(body: &str) -> Result<HttpResponse, TransportError> {
    ScriptedTransport::respond(200, body)
}

fn status(code: u16, body: &str) -> Result<HttpResponse, TransportError> {
    ScriptedTransport::respond(code, body)
}

fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

fn record_changes(client: &TestClient) -> Rc<RefCell<Vec<LoadingChange>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    client
        .api
        .loading()
        .subscribe(move |change| sink.borrow_mut().push(change.clone()));
    seen
}

// =============================================================
// Configuration
// =============================================================

#[test]
fn base_url_is_dev_host_on_localhost() {
    assert_eq!(ApiConfig::for_hostname("localhost").base_url, DEV_API_BASE);
    assert_eq!(ApiConfig::for_hostname("127.0.0.1").base_url, DEV_API_BASE);
    assert_eq!(ApiConfig::for_hostname("app.partnerhub.io").base_url, "/api");
}

#[test]
fn search_endpoint_encodes_query() {
    assert_eq!(search_endpoint("coffee & tea", None), "/search?q=coffee%20%26%20tea");
    assert_eq!(search_endpoint("vlog", Some("creators")), "/search?q=vlog&type=creators");
}

#[test]
fn server_message_prefers_message_then_error() {
    let body = serde_json::json!({"message": "m1", "error": "m2"});
    assert_eq!(server_message(&body).as_deref(), Some("m1"));
    let body = serde_json::json!({"error": "m2"});
    assert_eq!(server_message(&body).as_deref(), Some("m2"));
    assert_eq!(server_message(&serde_json::json!({})), None);
}

// =============================================================
// Request shaping
// =============================================================

#[test]
fn request_targets_base_url_with_json_content_type() {
    let client = test_client(vec![ok(r#"{"items":[]}"#)]);
    let body = block_on(client.api.list_offers()).expect("offers");
    assert_eq!(body, serde_json::json!({"items": []}));

    let sent = client.api.transport().last_request();
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.url, "/api/offers");
    assert_eq!(sent.header("content-type"), Some("application/json"));
    assert_eq!(sent.header("Authorization"), None);
}

#[test]
fn caller_headers_override_defaults() {
    let client = test_client(vec![ok("{}")]);
    let options = RequestOptions::get().with_header("content-type", "text/plain");
    block_on(client.api.request("/custom", options)).expect("custom");

    let sent = client.api.transport().last_request();
    assert_eq!(sent.header("Content-Type"), Some("text/plain"));
    assert_eq!(sent.headers.len(), 1);
}

#[test]
fn persisted_token_is_sent_as_bearer() {
    let client = test_client_with_store(vec![ok("{}")], MemoryTokenStore::with_token("tok-1"));
    assert!(client.api.is_authenticated());
    block_on(client.api.get_profile()).expect("profile");
    assert_eq!(
        client.api.transport().last_request().header("authorization"),
        Some("Bearer tok-1")
    );
}

#[test]
fn json_body_is_serialized() {
    let client = test_client(vec![ok("{}")]);
    block_on(client.api.update_deal("d 1", &serde_json::json!({"status": "live"}))).expect("deal");

    let sent = client.api.transport().last_request();
    assert_eq!(sent.method, Method::Put);
    assert_eq!(sent.url, "/api/deals/d%201");
    assert_eq!(sent.body, RequestBody::Json(r#"{"status":"live"}"#.to_owned()));
}

#[test]
fn upload_sends_multipart_without_json_content_type() {
    let client = test_client_with_store(vec![ok(r#"{"url":"/f/1"}"#)], MemoryTokenStore::with_token("t"));
    block_on(client.api.upload_file("a.png", "image/png", vec![1, 2, 3])).expect("upload");

    let sent = client.api.transport().last_request();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.url, "/api/files/upload");
    assert_eq!(sent.header("Content-Type"), None);
    assert_eq!(sent.header("Authorization"), Some("Bearer t"));
    assert!(sent.body.is_form());
}

#[test]
fn empty_success_body_decodes_to_null() {
    let client = test_client(vec![ok("")]);
    let body = block_on(client.api.delete_offer("o1")).expect("delete");
    assert_eq!(body, Value::Null);
}

#[test]
fn invalid_success_body_is_decode_error() {
    let client = test_client(vec![ok("<html>")]);
    let err = block_on(client.api.wallet()).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

// =============================================================
// Retry and backoff
// =============================================================

#[test]
fn retryable_status_is_retried_with_exponential_backoff() {
    let client = test_client(vec![status(503, ""), status(503, ""), ok(r#"{"ok":true}"#)]);
    let body = block_on(client.api.list_deals()).expect("eventually ok");

    assert_eq!(body, serde_json::json!({"ok": true}));
    assert_eq!(client.api.transport().attempts(), 3);
    assert_eq!(*client.api.transport().sleeps.borrow(), ms(&[100, 200]));
}

#[test]
fn retries_stop_after_max_attempts() {
    let script = (0..10).map(|_| status(500, "")).collect();
    let client = test_client(script);
    let err = block_on(client.api.notifications()).unwrap_err();

    assert_eq!(client.api.transport().attempts(), 4);
    assert_eq!(*client.api.transport().sleeps.borrow(), ms(&[100, 200, 400]));
    assert_eq!(
        err,
        ApiError::Server { status: 500, message: "Request failed with status 500".to_owned() }
    );
}

#[test]
fn exhausted_retry_keeps_server_message() {
    let script = (0..4).map(|_| status(429, r#"{"message":"slow down"}"#)).collect();
    let client = test_client(script);
    let err = block_on(client.api.conversations()).unwrap_err();
    assert_eq!(err.to_string(), "slow down");
    assert_eq!(err.status(), Some(429));
}

#[test]
fn application_error_is_not_retried() {
    let client = test_client(vec![status(422, r#"{"error":"amount too low"}"#)]);
    let err = block_on(client.api.create_offer(&serde_json::json!({"amount": 1}))).unwrap_err();

    assert_eq!(client.api.transport().attempts(), 1);
    assert!(client.api.transport().sleeps.borrow().is_empty());
    assert_eq!(
        err,
        ApiError::Application { status: 422, message: "amount too low".to_owned() }
    );
}

#[test]
fn application_error_without_message_is_generic() {
    let client = test_client(vec![status(404, "not json")]);
    let err = block_on(client.api.get_offer("missing")).unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status 404");
}

#[test]
fn network_failure_is_retried_then_surfaced() {
    let script = (0..4).map(|_| ScriptedTransport::offline()).collect();
    let client = test_client(script);
    let err = block_on(client.api.calendar_events()).unwrap_err();

    assert_eq!(client.api.transport().attempts(), 4);
    assert_eq!(*client.api.transport().sleeps.borrow(), ms(&[100, 200, 400]));
    assert!(matches!(err, ApiError::Network(_)));
}

#[test]
fn network_failure_recovers() {
    let client = test_client(vec![ScriptedTransport::offline(), ok(r#"{"events":[]}"#)]);
    let body = block_on(client.api.calendar_events()).expect("recovered");
    assert_eq!(body, serde_json::json!({"events": []}));
    assert_eq!(*client.api.transport().sleeps.borrow(), ms(&[100]));
}

#[test]
fn non_network_transport_failure_is_not_retried() {
    let client = test_client(vec![Err(TransportError::Other("bad header".to_owned()))]);
    let err = block_on(client.api.admin_dashboard()).unwrap_err();
    assert_eq!(client.api.transport().attempts(), 1);
    assert_eq!(err, ApiError::Transport("bad header".to_owned()));
}

// =============================================================
// Unauthorized
// =============================================================

#[test]
fn unauthorized_clears_token_redirects_and_never_retries() {
    let client = test_client_with_store(
        vec![status(401, r#"{"message":"expired"}"#)],
        MemoryTokenStore::with_token("stale"),
    );
    let err = block_on(client.api.get_profile()).unwrap_err();

    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(client.api.transport().attempts(), 1);
    assert!(client.api.transport().sleeps.borrow().is_empty());
    assert!(!client.api.is_authenticated());
    assert_eq!(client.store.load(), None);
    assert_eq!(client.navigator.visits(), vec!["/".to_owned()]);
}

#[test]
fn unauthorized_after_retry_still_terminal() {
    let client = test_client(vec![status(503, ""), status(401, ""), ok("{}")]);
    let err = block_on(client.api.wallet()).unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(client.api.transport().attempts(), 2);
}

// =============================================================
// Loading registry
// =============================================================

#[test]
fn endpoint_is_loading_across_all_attempts() {
    let client = test_client(vec![status(502, ""), status(502, ""), ok("{}")]);
    let registry = client.api.loading().clone();
    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    client
        .api
        .transport()
        .set_probe(move |_| sink.borrow_mut().push(registry.is_loading("/deals")));

    assert!(!client.api.loading().is_loading("/deals"));
    block_on(client.api.list_deals()).expect("deals");

    assert_eq!(*observed.borrow(), vec![true, true, true]);
    assert!(!client.api.loading().is_loading("/deals"));
}

#[test]
fn loading_emits_once_per_transition_not_per_attempt() {
    let client = test_client(vec![status(500, ""), ok("{}")]);
    let seen = record_changes(&client);
    block_on(client.api.wallet()).expect("wallet");

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_loading);
    assert_eq!(seen[0].total_loading, 1);
    assert!(!seen[1].is_loading);
    assert_eq!(seen[1].total_loading, 0);
}

#[test]
fn loading_is_cleared_on_every_exit_path() {
    let failures = vec![
        vec![status(401, "")],
        vec![status(400, "")],
        (0..4).map(|_| status(503, "")).collect(),
        (0..4).map(|_| ScriptedTransport::offline()).collect(),
        vec![ok("not json")],
    ];
    for script in failures {
        let client = test_client(script);
        assert!(block_on(client.api.get_profile()).is_err());
        assert!(!client.api.loading().any_loading());
    }
}

// =============================================================
// Token lifecycle
// =============================================================

#[test]
fn login_captures_token_for_later_requests() {
    let client = test_client(vec![ok(r#"{"token":"new-token","user":{}}"#), ok("{}")]);
    let credentials = LoginRequest { email: "a@b.io".into(), password: "pw".into() };
    block_on(client.api.login(&credentials)).expect("login");

    assert_eq!(client.api.token().as_deref(), Some("new-token"));
    assert_eq!(client.store.load().as_deref(), Some("new-token"));
    block_on(client.api.list_offers()).expect("offers");
    assert_eq!(
        client.api.transport().last_request().header("Authorization"),
        Some("Bearer new-token")
    );
}

#[test]
fn issued_token_requires_non_empty_string() {
    assert_eq!(issued_token(&serde_json::json!({"token": "t"})), Some("t"));
    assert_eq!(issued_token(&serde_json::json!({"token": ""})), None);
    assert_eq!(issued_token(&serde_json::json!({"token": 7})), None);
    assert_eq!(issued_token(&serde_json::json!({"otpRequired": true})), None);
}

#[test]
fn verify_without_token_leaves_auth_untouched() {
    let client = test_client_with_store(vec![ok(r#"{"verified":true}"#)], MemoryTokenStore::with_token("old"));
    let verification = VerifyOtpRequest { contact: "a@b.io".into(), otp: "123456".into() };
    block_on(client.api.register_verify(&verification)).expect("verify");
    assert_eq!(client.api.token().as_deref(), Some("old"));
}

#[test]
fn verify_with_token_authenticates() {
    let client = test_client(vec![ok(r#"{"token":"otp-token"}"#)]);
    let verification = VerifyOtpRequest { contact: "+15550100".into(), otp: "000000".into() };
    block_on(client.api.register_verify(&verification)).expect("verify");
    assert_eq!(client.api.token().as_deref(), Some("otp-token"));

    let sent = client.api.transport().last_request();
    assert_eq!(sent.url, "/api/auth/verify-otp");
    assert_eq!(
        sent.body,
        RequestBody::Json(r#"{"contact":"+15550100","otp":"000000"}"#.to_owned())
    );
}

#[test]
fn register_start_serializes_role() {
    let client = test_client(vec![ok("{}")]);
    let registration = RegisterRequest {
        name: "Acme".into(),
        email: Some("team@acme.io".into()),
        phone: None,
        password: "pw".into(),
        user_type: crate::state::auth::UserRole::Marketer,
    };
    block_on(client.api.register_start(&registration)).expect("register");
    let RequestBody::Json(text) = client.api.transport().last_request().body else {
        panic!("expected json body");
    };
    let sent: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(sent["userType"], "marketer");
    assert!(sent.get("phone").is_none());
}

#[test]
fn logout_clears_token_even_when_server_fails() {
    let script = (0..4).map(|_| ScriptedTransport::offline()).collect();
    let client = test_client_with_store(script, MemoryTokenStore::with_token("tok"));
    block_on(client.api.logout());

    assert!(!client.api.is_authenticated());
    assert_eq!(client.store.load(), None);
    assert_eq!(client.api.transport().last_request().url, "/api/auth/logout");
}

#[test]
fn logout_sends_bearer_before_clearing() {
    let client = test_client_with_store(vec![ok("{}")], MemoryTokenStore::with_token("tok"));
    block_on(client.api.logout());
    assert_eq!(
        client.api.transport().last_request().header("Authorization"),
        Some("Bearer tok")
    );
    assert!(!client.api.is_authenticated());
}

#[test]
fn set_and_clear_token_round_through_store() {
    let client = test_client(vec![]);
    client.api.set_token("abc");
    assert_eq!(client.store.load().as_deref(), Some("abc"));
    client.api.clear_token();
    assert_eq!(client.store.load(), None);
    assert_eq!(client.api.token(), None);
}
