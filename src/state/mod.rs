//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain so individual components can depend on small
//! focused models. Only auth is page-wide today.

pub mod auth;
pub mod session;
