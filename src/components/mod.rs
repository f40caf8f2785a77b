//! Leptos components rendered into the server-provided page shell.

pub mod nav_actions;
