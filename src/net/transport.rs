//! HTTP transport seam between the API client and the browser.
//!
//! SYSTEM CONTEXT
//! ==============
//! `ApiClient` only ever sees `HttpRequest`/`HttpResponse`. The browser build
//! plugs in `GlooTransport` (fetch + `setTimeout`); tests plug in scripted
//! fakes so the retry loop runs without a network or real timers.

use std::time::Duration;

/// HTTP verbs used by the platform API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One field of a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Multipart form payload. The transport picks the boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormPayload {
    pub fields: Vec<FormField>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::Text { name: name.into(), value: value.into() });
        self
    }

    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.fields.push(FormField::File {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Pre-serialized JSON text.
    Json(String),
    Form(FormPayload),
}

impl RequestBody {
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

/// Fully shaped request, ready to hand to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response: status plus the undecoded body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer (no response was received).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connectivity failure: DNS, refused connection, offline, CORS abort.
    #[error("network error: {0}")]
    Network(String),
    /// Anything else the transport could not do, e.g. building the request.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Sends requests and provides the cooperative sleep used between retries.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Issue one HTTP request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no HTTP response was obtained.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Suspend the caller for `delay` without blocking the event loop.
    async fn sleep(&self, delay: Duration);
}

/// Browser transport backed by `fetch` through `gloo-net`.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

#[cfg(feature = "hydrate")]
impl Transport for GlooTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        use gloo_net::http::Request;

        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Put => Request::put(&request.url),
            Method::Patch => Request::patch(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let built = match &request.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(text) => builder.body(text.as_str()),
            RequestBody::Form(form) => builder.body(form_data(form)?),
        }
        .map_err(|e| TransportError::Other(e.to_string()))?;

        let resp = built.send().await.map_err(classify_gloo_error)?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }

    async fn sleep(&self, delay: Duration) {
        gloo_timers::future::sleep(delay).await;
    }
}

/// `fetch` rejects with a JS `TypeError` on connectivity failures, which
/// surfaces as `gloo_net::Error::JsError`.
#[cfg(feature = "hydrate")]
fn classify_gloo_error(err: gloo_net::Error) -> TransportError {
    match err {
        gloo_net::Error::JsError(e) => TransportError::Network(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(feature = "hydrate")]
fn form_data(form: &FormPayload) -> Result<web_sys::FormData, TransportError> {
    let js_err = |e: wasm_bindgen::JsValue| TransportError::Other(format!("{e:?}"));
    let data = web_sys::FormData::new().map_err(js_err)?;
    for field in &form.fields {
        match field {
            FormField::Text { name, value } => {
                data.append_with_str(name, value).map_err(js_err)?;
            }
            FormField::File { name, filename, content_type, bytes } => {
                let chunk = js_sys::Uint8Array::from(bytes.as_slice());
                let parts = js_sys::Array::of1(&chunk);
                let options = web_sys::BlobPropertyBag::new();
                options.set_type(content_type);
                let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                    .map_err(js_err)?;
                data.append_with_blob_and_filename(name, &blob, filename)
                    .map_err(js_err)?;
            }
        }
    }
    Ok(data)
}
