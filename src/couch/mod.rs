//! CouchDB document store integration.

pub mod client;
pub mod types;

pub use client::CouchStore;
pub use types::{CouchError, SortDirection};
