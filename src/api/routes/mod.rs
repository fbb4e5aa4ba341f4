//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task creation and lookup
//! - [`system`] - Health, events, OpenAPI

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;
