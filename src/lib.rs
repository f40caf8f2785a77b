//! # partnerhub-web
//!
//! Leptos + WASM front end for the PartnerHub creator/brand collaboration
//! platform.
//!
//! The crate holds the REST API client (auth, retry, loading state), the
//! auth session store, and the navigation controller that keeps the page
//! chrome and route access in step with the session. Browser bindings are
//! gated behind the `hydrate` feature; everything else runs natively so it
//! can be unit tested.

#[cfg(feature = "hydrate")]
pub mod app;
pub mod components;
pub mod nav;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
mod testing;
