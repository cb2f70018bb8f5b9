//! Request validation
//!
//! Field checks run by the transport layer before a request reaches the
//! content services. Every failing field contributes one message; a later
//! validator on the same field overwrites an earlier one.

use crate::error::{ServiceError, ValidationErrors};
use crate::models::{PageListRequest, SubListRequest};

pub const TITLE_ID_PARAM: &str = "title_id";
pub const CHAPTER_PARAM: &str = "chapter";

/// One field check
pub trait Validator {
    /// `Err(message)` when the field is invalid
    ///
    /// # Errors
    ///
    /// Returns the user-facing message of the failed check.
    fn validate(&self) -> Result<(), String>;

    fn field_name(&self) -> &str;
}

fn blank(field: &str) -> String {
    format!("{field} cannot be blank")
}

/// Field must be present and not only whitespace
#[derive(Debug, Clone, Copy)]
pub struct PresenceValidator<'a> {
    pub field: &'a str,
    pub value: Option<&'a str>,
}

impl Validator for PresenceValidator<'_> {
    fn validate(&self) -> Result<(), String> {
        match self.value.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(blank(self.field)),
        }
    }

    fn field_name(&self) -> &str {
        self.field
    }
}

/// Field must be present and a number that fits a finite `f32` chapter
#[derive(Debug, Clone, Copy)]
pub struct NumberValidator<'a> {
    pub field: &'a str,
    pub value: Option<&'a str>,
}

impl Validator for NumberValidator<'_> {
    fn validate(&self) -> Result<(), String> {
        let value = match self.value.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(blank(self.field)),
        };

        match value.parse::<f32>() {
            Ok(number) if number.is_finite() => Ok(()),
            _ => Err(format!("{} must be a number", self.field)),
        }
    }

    fn field_name(&self) -> &str {
        self.field
    }
}

/// Run every validator and collect the failures
///
/// # Errors
///
/// Returns the field to message map when at least one check failed.
pub fn validate_all(validators: &[&dyn Validator]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for validator in validators {
        if let Err(message) = validator.validate() {
            errors.insert(validator.field_name(), message);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validate raw parameters of a chapter list request
///
/// # Errors
///
/// Returns `ServiceError::Validation` when `title_id` is blank.
pub fn sub_list_request(title_id: Option<&str>) -> Result<SubListRequest, ServiceError> {
    validate_all(&[&PresenceValidator {
        field: TITLE_ID_PARAM,
        value: title_id,
    }])
    .map_err(ServiceError::Validation)?;

    Ok(SubListRequest::new(title_id.unwrap_or_default()))
}

/// Validate raw parameters of a page list request
///
/// # Errors
///
/// Returns `ServiceError::Validation` when `title_id` is blank or `chapter`
/// is blank or not a number.
pub fn page_list_request(title_id: Option<&str>, chapter: Option<&str>) -> Result<PageListRequest, ServiceError> {
    validate_all(&[
        &PresenceValidator {
            field: TITLE_ID_PARAM,
            value: title_id,
        },
        &PresenceValidator {
            field: CHAPTER_PARAM,
            value: chapter,
        },
        &NumberValidator {
            field: CHAPTER_PARAM,
            value: chapter,
        },
    ])
    .map_err(ServiceError::Validation)?;

    Ok(PageListRequest::parse(
        title_id.unwrap_or_default(),
        chapter.unwrap_or_default().trim(),
    ))
}
