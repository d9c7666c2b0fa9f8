use std::{error, fmt};

use crate::geometry::GeometryKind;

pub mod ewkb;
pub mod geometry;
pub mod route;
pub mod user;

/// A domain-level validation failure. Always caller-correctable; surfaced
/// before any storage call is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    WrongGeometryKind {
        field: &'static str,
        expected: GeometryKind,
    },
    NegativeValue(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => {
                write!(f, "{} is required", field)
            }
            ValidationError::WrongGeometryKind { field, expected } => {
                write!(f, "{} must be a {}", field, expected)
            }
            ValidationError::NegativeValue(field) => {
                write!(f, "{} must be non-negative", field)
            }
        }
    }
}

impl error::Error for ValidationError {}
