//! Shared DTO types used across multiple v1 API endpoints.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::MemoirError;
use crate::models::Era;

/// An inclusive range of years. Either bound may be left open.
///
/// Wire format: `{ "yearStart": 2019, "yearEnd": 2021, "label": "College" }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_year_order"))]
pub struct EraDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_start: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_end: Option<i32>,
    /// Free-form name for the era, echoed back in the past-self prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub label: Option<String>,
}

fn validate_year_order(era: &EraDto) -> Result<(), ValidationError> {
    match (era.year_start, era.year_end) {
        (Some(start), Some(end)) if start > end => {
            let mut error = ValidationError::new("year_order");
            error.message = Some("yearStart must not be after yearEnd".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

impl From<EraDto> for Era {
    fn from(dto: EraDto) -> Self {
        Self {
            year_start: dto.year_start,
            year_end: dto.year_end,
            label: dto.label.filter(|l| !l.trim().is_empty()),
        }
    }
}

impl From<Era> for EraDto {
    fn from(era: Era) -> Self {
        Self {
            year_start: era.year_start,
            year_end: era.year_end,
            label: era.label,
        }
    }
}

/// Runs the derived validation rules and flattens failures into one message.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), MemoirError> {
    request.validate().map_err(|errors| {
        let mut messages: Vec<String> = Vec::new();
        collect_messages(&errors, &mut messages);
        if messages.is_empty() {
            messages.push(errors.to_string());
        }
        MemoirError::Validation(messages.join("; "))
    })
}

fn collect_messages(errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            validator::ValidationErrorsKind::Field(list) => {
                for error in list {
                    match &error.message {
                        Some(message) => out.push(message.to_string()),
                        None if *field == "__all__" => out.push(error.code.to_string()),
                        None => out.push(format!("Invalid value for {field}")),
                    }
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            validator::ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}
