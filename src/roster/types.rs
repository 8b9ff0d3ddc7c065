//! Core data types and error definitions for the roster service.

use crate::couch::{CouchError, SortDirection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A student document as stored in CouchDB and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Document identifier assigned at creation; immutable.
    #[serde(rename = "_id")]
    pub id: String,
    /// CouchDB revision token; absent until the first write completes.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Given name, trimmed, at most 15 characters.
    pub first_name: String,
    /// Family name, trimmed, at most 15 characters.
    pub last_name: String,
    /// Grade in the closed range [0, 100].
    pub grade: f64,
    /// Canonical class names with no duplicates.
    #[serde(default)]
    pub classes: Vec<String>,
    /// RFC3339 timestamp set once at creation.
    pub created_on: String,
    /// RFC3339 timestamp refreshed by class-list writes.
    pub updated_on: String,
}

/// Fields accepted when creating a student; validation runs in the service.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    /// Given name; required by validation.
    pub first_name: Option<String>,
    /// Family name; required by validation.
    pub last_name: Option<String>,
    /// Grade; required by validation.
    pub grade: Option<f64>,
    /// Initial class list, canonicalized before storage.
    pub classes: Option<Vec<String>>,
}

/// Partial update applied to an existing student; absent fields keep their
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    /// Replacement given name.
    pub first_name: Option<String>,
    /// Replacement family name.
    pub last_name: Option<String>,
    /// Replacement grade.
    pub grade: Option<f64>,
    /// Replacement class list, canonicalized before storage.
    pub classes: Option<Vec<String>>,
}

/// Validated listing options parsed from the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Optional last-name ordering.
    pub sort: Option<SortDirection>,
    /// Optional cap on the number of returned students.
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Parse raw `sort`/`limit` query values into typed options.
    ///
    /// `sort` accepts `asc` or `desc` (case-insensitive); `limit` must be an
    /// integer of at least 1.
    pub fn parse(sort: Option<&str>, limit: Option<&str>) -> Result<Self, RosterError> {
        let sort = match sort.map(str::trim).filter(|value| !value.is_empty()) {
            None => None,
            Some(value) => match value.to_lowercase().as_str() {
                "asc" => Some(SortDirection::Asc),
                "desc" => Some(SortDirection::Desc),
                _ => {
                    return Err(RosterError::Validation(format!(
                        "sort must be 'asc' or 'desc', got '{value}'"
                    )));
                }
            },
        };

        let limit = match limit.map(str::trim).filter(|value| !value.is_empty()) {
            None => None,
            Some(value) => match value.parse::<usize>() {
                Ok(parsed) if parsed >= 1 => Some(parsed),
                _ => {
                    return Err(RosterError::Validation(format!(
                        "limit must be a positive integer, got '{value}'"
                    )));
                }
            },
        };

        Ok(Self { sort, limit })
    }
}

/// Errors emitted by the roster service.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Input failed schema validation.
    #[error("{0}")]
    Validation(String),
    /// No student document exists for the requested id.
    #[error("No student found with id {0}")]
    NotFound(String),
    /// A required request parameter was missing or blank.
    #[error("Bad Request")]
    BadRequest,
    /// CouchDB interaction failed.
    #[error("Storage request failed: {0}")]
    Store(#[from] CouchError),
}
