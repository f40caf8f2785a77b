//! Networking modules for the platform REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` is the single chokepoint for backend calls. `retry` and `loading`
//! hold the policy and observability state it drives, `transport` is the
//! seam to `fetch`, and `types` defines request payloads.

pub mod api;
pub mod error;
pub mod loading;
pub mod retry;
pub mod transport;
pub mod types;
