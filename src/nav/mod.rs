//! Navigation chrome driven by the auth session.
//!
//! SYSTEM CONTEXT
//! ==============
//! `page` knows which pages need a session and what they are called, `view`
//! maps a session to render instructions, `dropdown` tracks the user menu,
//! and `controller` ties them to an effect on the `AuthStore` signal and a
//! rendering surface.

pub mod controller;
#[cfg(feature = "hydrate")]
pub mod dom;
pub mod dropdown;
pub mod page;
pub mod view;
