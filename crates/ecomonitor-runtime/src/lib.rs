//! Runtime layer for the Eco-Village Monitor.
//!
//! Owns the login/logout session around a data source and the insights
//! request to the text-generation service.

pub mod session;
pub mod summary;

pub use ecomonitor_core as core;
pub use ecomonitor_data as data;
