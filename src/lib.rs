#![deny(missing_docs)]

//! Core library for the rosterd student roster service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// CouchDB document store integration.
pub mod couch;
/// Structured logging and tracing setup.
pub mod logging;
/// Roster activity counters.
pub mod metrics;
/// Student records, class lists, and the roster service layer.
pub mod roster;
