use std::{error, fmt};

use model::{geometry::GeometryError, ValidationError};

use crate::database::DatabaseError;

pub mod database;
pub mod usecase;

/// The error surface handed to the request layer. Client-fixable problems
/// (validation, malformed geometry, unknown or malformed ids, ownership)
/// are distinct variants from server-side storage failures, so an
/// upstream layer can map them to response codes without parsing text.
#[derive(Debug)]
pub enum RequestError {
    Validation(ValidationError),
    Geometry(GeometryError),
    NotFound,
    InvalidId(String),
    Unauthorized,
    Storage(Box<dyn error::Error + Send + Sync>),
    Commit(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Validation(why) => why.fmt(f),
            RequestError::Geometry(why) => why.fmt(f),
            RequestError::NotFound => write!(f, "not found"),
            RequestError::InvalidId(id) => write!(f, "invalid identifier: {}", id),
            RequestError::Unauthorized => {
                write!(f, "unauthorized: user does not own the route")
            }
            RequestError::Storage(why) => write!(f, "storage error: {}", why),
            RequestError::Commit(why) => write!(f, "commit failed: {}", why),
        }
    }
}

impl error::Error for RequestError {}

impl From<ValidationError> for RequestError {
    fn from(why: ValidationError) -> Self {
        RequestError::Validation(why)
    }
}

impl From<GeometryError> for RequestError {
    fn from(why: GeometryError) -> Self {
        RequestError::Geometry(why)
    }
}

impl From<DatabaseError> for RequestError {
    fn from(why: DatabaseError) -> Self {
        match why {
            DatabaseError::NotFound => RequestError::NotFound,
            DatabaseError::InvalidId(id) => RequestError::InvalidId(id),
            DatabaseError::Commit(why) => RequestError::Commit(why),
            DatabaseError::Storage(why) => RequestError::Storage(why),
            why @ DatabaseError::Rollback { .. } => {
                RequestError::Storage(Box::new(why))
            }
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;
