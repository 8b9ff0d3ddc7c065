//! Shared types used by the CouchDB client.

use crate::roster::Student;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid CouchDB URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// CouchDB responded with an unexpected status code.
    #[error("Unexpected CouchDB response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from CouchDB.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Sort direction applied to the `lastName` field in Mango queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending by last name.
    Asc,
    /// Descending by last name.
    Desc,
}

impl SortDirection {
    /// Wire value used in Mango sort clauses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct FindResponse {
    #[serde(default)]
    pub(crate) docs: Vec<Student>,
    #[serde(default)]
    pub(crate) bookmark: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct WriteResponse {
    pub(crate) rev: String,
}
