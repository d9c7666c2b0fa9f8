use utility::id::{HasId, Id};
use uuid::Uuid;

use crate::ValidationError;

/// A registered rider. Authentication lives with an external identity
/// provider; `external_id` is the subject identifier that provider hands
/// us, and is how the request layer resolves the acting user.
#[derive(Debug, Clone)]
pub struct User {
    id: Id<User>,
    external_id: String,
    name: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl HasId for User {
    type IdType = String;
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Id<User>,
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    pub fn new(
        external_id: String,
        name: String,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<User, ValidationError> {
        if external_id.trim().is_empty() {
            return Err(ValidationError::MissingField("externalId"));
        }
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if let Some(email) = &email {
            if email.trim().is_empty() {
                return Err(ValidationError::MissingField("email"));
            }
        }

        Ok(User {
            id: Id::new(Uuid::now_v7().to_string()),
            external_id,
            name,
            email,
            first_name,
            last_name,
        })
    }

    pub fn reconstruct(record: UserRecord) -> User {
        User {
            id: record.id,
            external_id: record.external_id,
            name: record.name,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }

    pub fn id(&self) -> &Id<User> {
        &self.id
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }
}
