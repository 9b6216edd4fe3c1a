//! Application-level orchestration.
//!
//! This module runs lookups on the Tokio runtime on behalf of the UI thread, which owns
//! all search state. UI layers send commands in and receive outcomes back as events.

mod controller;

pub(crate) use controller::{run_controller, LookupCommand};
