use cycling::database::Result;
use model::user::{User, UserRecord};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use crate::data_model::parse_id;

/// Table: users
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserRow {
    pub fn from_model(user: &User) -> Result<UserRow> {
        Ok(UserRow {
            id: parse_id(user.id().raw_ref())?,
            external_id: user.external_id().to_owned(),
            name: user.name().to_owned(),
            email: user.email().map(str::to_owned),
            first_name: user.first_name().map(str::to_owned),
            last_name: user.last_name().map(str::to_owned),
        })
    }

    pub fn to_model(self) -> User {
        User::reconstruct(UserRecord {
            id: Id::new(self.id.to_string()),
            external_id: self.external_id,
            name: self.name,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}
