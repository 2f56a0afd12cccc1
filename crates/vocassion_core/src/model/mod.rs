//! Domain model for profiles, the points ledger and progression objects.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and the HTTP layer.
//! - Hold the pure progression arithmetic (streak check-ins, levels,
//!   achievement thresholds, goal progress) so it is testable without storage.
//!
//! # Invariants
//! - Every record is identified by a stable UUID except streaks, which are
//!   keyed by `(profile, activity)`.
//! - Point amounts stored in the ledger are strictly positive and never
//!   exceed [`MAX_POINTS`] per entry.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod achievement;
pub mod challenge;
pub mod community;
pub mod goal;
pub mod ikigai;
pub mod ledger;
pub mod profile;
pub mod reflection;
pub mod streak;

/// Largest amount a single reward, penalty or goal cost may carry.
pub const MAX_POINTS: i64 = 1_000_000;

/// Input validation failure for create/update requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank.
    Required(&'static str),
    /// Several required fields are missing; names in declaration order.
    MissingFields(Vec<&'static str>),
    /// Text shorter than the minimum length.
    TooShort { field: &'static str, min_chars: usize },
    /// Numeric value must be strictly positive.
    NotPositive { field: &'static str, value: i64 },
    /// Numeric value outside its allowed range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Enumerated field received an unknown value.
    UnknownValue { field: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "`{field}` is required"),
            Self::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::TooShort { field, min_chars } => {
                write!(f, "`{field}` must be at least {min_chars} characters")
            }
            Self::NotPositive { field, value } => {
                write!(f, "`{field}` must be positive, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` must be within {min}..={max}, got {value}"),
            Self::UnknownValue { field, value } => {
                write!(f, "unknown value `{value}` for `{field}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Returns the trimmed value or `Required(field)` when blank.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Returns `Ok(())` when `value > 0`.
pub(crate) fn require_positive(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// Returns `Ok(())` when `min <= value <= MAX_POINTS`.
pub(crate) fn require_points(
    field: &'static str,
    value: i64,
    min: i64,
) -> Result<(), ValidationError> {
    if (min..=MAX_POINTS).contains(&value) {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field,
        value,
        min,
        max: MAX_POINTS,
    })
}
