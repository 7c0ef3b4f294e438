//! Shared domain types for the Eco-Village Energy Monitor.
//!
//! Holds the resident / dwelling / usage-record model, the error taxonomy,
//! command-line settings and the number formatting helpers used by every
//! other crate in the workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{MonitorError, Result};
