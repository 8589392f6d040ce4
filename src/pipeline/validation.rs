// Input validation for submissions.
//
// Every rule is checked, not just the first failing one, so the caller can
// show all problems at once. Lengths are counted in characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::{Coordinates, NewReport};

pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 2000;
pub const LOCATION_MIN_CHARS: usize = 3;
pub const LOCATION_MAX_CHARS: usize = 500;
pub const CONTACT_MAX_CHARS: usize = 200;

/// Raw submission as received from a form or API call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionInput {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Set by the caller for signed-in submissions, never taken from the body.
    #[serde(skip)]
    pub submitted_by: Option<String>,
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All violated rules for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", join_field_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {min} and {max} characters (got {len})"),
        });
    }
}

/// Validate and normalize a submission. Surrounding whitespace is trimmed
/// and a blank contact is treated as absent.
pub fn validate(input: SubmissionInput) -> Result<NewReport, ValidationErrors> {
    let message = input.message.trim().to_string();
    let location = input.location.trim().to_string();
    let contact = input
        .contact
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let mut errors = Vec::new();

    check_length(&mut errors, "message", &message, MESSAGE_MIN_CHARS, MESSAGE_MAX_CHARS);
    check_length(&mut errors, "location", &location, LOCATION_MIN_CHARS, LOCATION_MAX_CHARS);

    if let Some(ref c) = contact {
        let len = c.chars().count();
        if len > CONTACT_MAX_CHARS {
            errors.push(FieldError {
                field: "contact",
                message: format!("must be at most {CONTACT_MAX_CHARS} characters (got {len})"),
            });
        }
    }

    let coordinates = match (input.latitude, input.longitude) {
        (None, None) => None,
        (Some(latitude), Some(longitude)) => {
            if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude)) {
                errors.push(FieldError {
                    field: "latitude",
                    message: "must be between -90 and 90".to_string(),
                });
            }
            if !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude)) {
                errors.push(FieldError {
                    field: "longitude",
                    message: "must be between -180 and 180".to_string(),
                });
            }
            Some(Coordinates {
                latitude,
                longitude,
            })
        }
        _ => {
            errors.push(FieldError {
                field: "coordinates",
                message: "latitude and longitude must be provided together".to_string(),
            });
            None
        }
    };

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(NewReport {
        message,
        location,
        contact,
        coordinates,
        submitted_by: input.submitted_by,
    })
}
