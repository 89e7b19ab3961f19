use serde::{Deserialize, Serialize};

/// A user as it travels through the notification pipeline.
///
/// `id` is assigned by the record store and is absent only before the first
/// write. `phone` is never `Some("")`: empty strings are normalised to `None`
/// by every constructor and by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "phone_is_absent")]
    pub phone: Option<String>,
}

impl UserRecord {
    /// Build a record that has not been persisted yet.
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            phone: normalize_phone(phone),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Partition key used when publishing: the id in decimal form.
    pub fn partition_key(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

/// Treat an empty phone number as "no phone number".
pub fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.filter(|p| !p.is_empty())
}

fn phone_is_absent(phone: &Option<String>) -> bool {
    phone.as_deref().map_or(true, str::is_empty)
}
