//! Student records, class-list normalization, and the roster service.

pub mod classes;
pub mod service;
pub mod types;
mod validate;

pub use service::{RosterApi, RosterService};
pub use types::{ListOptions, NewStudent, RosterError, Student, StudentPatch};
