//! User and group models.

use roster_core::types::{DbId, Timestamp};
use roster_core::users;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub uuid: Uuid,
    pub username: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn display_name(&self) -> String {
        users::display_name(&self.name, &self.first_name, &self.last_name, &self.username)
    }

    pub fn is_federated(&self) -> bool {
        users::is_federated(&self.username)
    }
}

/// DTO for creating a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub uuid: Option<Uuid>,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// DTO for updating profile fields. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
    }
}

/// A row from the `groups` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Group {
    pub id: DbId,
    pub name: String,
}
