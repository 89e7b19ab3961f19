use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use user_events::record::normalize_phone;
use user_events::{PublishResult, UserRecord};
use validator::{Validate, ValidationErrors};

/// A stored user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord::new(user.name.clone(), user.email.clone(), user.phone.clone()).with_id(user.id)
    }
}

/// Body of `POST /users` and `PUT /users/{id}`; update replaces every field.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 2, max = 50, message = "name must be 2 to 50 characters"))]
    pub name: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
}

impl UserRequest {
    /// Trim every field, then validate what will actually be stored.
    pub fn into_new_user(self) -> Result<NewUser, ValidationErrors> {
        let trimmed = UserRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(self.phone.map(|p| p.trim().to_string())),
        };
        trimmed.validate()?;

        Ok(NewUser {
            name: trimmed.name,
            email: trimmed.email,
            phone: trimmed.phone,
        })
    }
}

/// Validated field values ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Receipt returned by `POST /users/{id}/notify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub user_id: i64,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl NotifyResponse {
    pub fn new(user_id: i64, result: &PublishResult) -> Self {
        Self {
            user_id,
            topic: result.topic.clone(),
            partition: result.partition,
            offset: result.offset,
        }
    }
}
