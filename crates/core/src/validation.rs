//! Client-side validation schemas.
//!
//! Each form the console submits has a `validator`-derived schema. Values
//! are deserialized from the form's JSON, validated, and any failure is
//! flattened into [`FieldErrors`] so the UI can render messages inline next
//! to the offending input. None of this touches the network.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::entities::SelectOption;
use crate::types::DbId;

/// Field path -> first error message for that field.
pub type FieldErrors = BTreeMap<String, String>;

/// Key for errors that do not belong to a single field (malformed payload).
pub const FORM_ERROR_KEY: &str = "_form";

/// Allowed course visibility values.
pub const COURSE_VISIBILITIES: &[&str] = &["public", "department", "private"];

// ---------------------------------------------------------------------------
// Schema plumbing
// ---------------------------------------------------------------------------

/// A form schema: field-level rules via `Validate`, plus optional checks
/// spanning several fields.
pub trait FormSchema: Validate + DeserializeOwned {
    fn cross_field(&self) -> FieldErrors {
        FieldErrors::new()
    }
}

/// Deserialize `value` into `T` and validate it.
pub fn validate_json<T: FormSchema>(value: &serde_json::Value) -> Result<T, FieldErrors> {
    let form: T = serde_json::from_value(value.clone()).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.insert(FORM_ERROR_KEY.to_string(), e.to_string());
        errors
    })?;

    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => flatten_errors(&e),
    };
    for (field, message) in form.cross_field() {
        errors.entry(field).or_insert(message);
    }

    if errors.is_empty() {
        Ok(form)
    } else {
        Err(errors)
    }
}

/// Check `value` against `T` without keeping the parsed form.
pub fn check<T: FormSchema>(value: &serde_json::Value) -> Result<(), FieldErrors> {
    validate_json::<T>(value).map(|_| ())
}

/// Flatten `validator` errors to one message per field.
pub fn flatten_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", err.code));
                (field.to_string(), message)
            })
        })
        .collect()
}

fn validate_visibility(value: &str) -> Result<(), ValidationError> {
    if COURSE_VISIBILITIES.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("visibility");
        err.message = Some(format!("Visibility must be one of: {}", COURSE_VISIBILITIES.join(", ")).into());
        Err(err)
    }
}

// ---------------------------------------------------------------------------
// Entity modals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AccountForm {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 9, max = 15, message = "Phone number must have 9 to 15 digits"))]
    pub phone: Option<String>,
    #[validate(range(min = 1, message = "Department is required"))]
    pub department_id: DbId,
    #[validate(range(min = 1, message = "Role is required"))]
    pub role_id: DbId,
}

impl FormSchema for AccountForm {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct DepartmentForm {
    #[validate(length(min = 1, max = 100, message = "Department name is required"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: String,
}

impl FormSchema for DepartmentForm {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
}

impl FormSchema for CategoryForm {}

// ---------------------------------------------------------------------------
// Course wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CourseInfoForm {
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: String,
    #[validate(required(message = "Category is required"))]
    pub category: Option<SelectOption>,
    #[validate(length(min = 1, message = "Select at least one department"))]
    pub departments: Vec<SelectOption>,
    pub thumbnail_url: Option<String>,
}

impl FormSchema for CourseInfoForm {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CoursePublishForm {
    #[validate(custom(function = "validate_visibility"))]
    pub visibility: String,
    pub publish_at: Option<NaiveDate>,
}

impl FormSchema for CoursePublishForm {}

// ---------------------------------------------------------------------------
// Challenge wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChallengeInfoForm {
    #[validate(length(min = 1, max = 200, message = "Challenge name is required"))]
    pub name: String,
    pub description: String,
    #[validate(required(message = "Quarter is required"))]
    pub quarter: Option<SelectOption>,
    #[validate(required(message = "Start date is required"))]
    pub start_date: Option<NaiveDate>,
    #[validate(required(message = "End date is required"))]
    pub end_date: Option<NaiveDate>,
}

impl FormSchema for ChallengeInfoForm {
    fn cross_field(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end <= start {
                errors.insert("end_date".into(), "End date must be after start date".into());
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChallengeCoursesForm {
    #[validate(length(min = 1, message = "Select at least one course"))]
    pub courses: Vec<SelectOption>,
}

impl FormSchema for ChallengeCoursesForm {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChallengeParticipantsForm {
    #[validate(length(min = 1, message = "Select at least one department"))]
    pub departments: Vec<SelectOption>,
    #[validate(range(min = 1, message = "Participant limit must be at least 1"))]
    pub max_participants: Option<u32>,
}

impl FormSchema for ChallengeParticipantsForm {}
