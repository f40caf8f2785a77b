//! Browser-facing helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each module pairs a small trait (or pure helper) with a `hydrate`-only
//! browser implementation so the rest of the crate stays testable natively.

pub mod events;
pub mod location;
pub mod storage;
