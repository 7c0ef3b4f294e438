//! Data layer for the Eco-Village Monitor.
//!
//! Holds the per-session record store, the aggregation and export pipeline,
//! the digest sent to the insights service, and the data sources (live
//! Emporia adapter and synthetic generator) that fill the store.

pub mod aggregator;
pub mod digest;
pub mod export;
pub mod source;
pub mod store;

pub use ecomonitor_core as core;
