//! Field validation enforcing the student schema constraints.

use crate::roster::types::RosterError;

/// Upper bound on first and last names after trimming.
const NAME_MAX_LEN: usize = 15;

/// Which name field is being validated; selects the error message.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NameField {
    First,
    Last,
}

impl NameField {
    fn missing_message(self) -> &'static str {
        match self {
            Self::First => "Please provide a first name for this new student",
            Self::Last => "Please provide a last name for this new student",
        }
    }

    fn too_long_message(self) -> &'static str {
        match self {
            Self::First => "Student first names have an upper limit of 15 characters",
            Self::Last => "Student last names have an upper limit of 15 characters",
        }
    }
}

/// Validate a required name field, returning the trimmed value.
pub(crate) fn required_name(value: Option<&str>, field: NameField) -> Result<String, RosterError> {
    match value {
        Some(value) => name(value, field),
        None => Err(RosterError::Validation(field.missing_message().into())),
    }
}

/// Validate a present name value, returning the trimmed value.
pub(crate) fn name(value: &str, field: NameField) -> Result<String, RosterError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RosterError::Validation(field.missing_message().into()));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(RosterError::Validation(field.too_long_message().into()));
    }
    Ok(trimmed.to_string())
}

/// Validate a required grade field.
pub(crate) fn required_grade(value: Option<f64>) -> Result<f64, RosterError> {
    match value {
        Some(value) => grade(value),
        None => Err(RosterError::Validation(
            "Please give this new student a grade".into(),
        )),
    }
}

/// Validate a grade against the closed range [0, 100]. `NaN` is rejected.
pub(crate) fn grade(value: f64) -> Result<f64, RosterError> {
    if value.is_nan() {
        return Err(RosterError::Validation(
            "Please give this new student a grade".into(),
        ));
    }
    if value < 0.0 {
        return Err(RosterError::Validation("Minimum grade is 0".into()));
    }
    if value > 100.0 {
        return Err(RosterError::Validation("Maximum grade is 100".into()));
    }
    Ok(value)
}
