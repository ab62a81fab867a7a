use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Pure user model for inter-module communication (no serde)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields the owner of an identity may set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub full_name: String,
    /// `None` keeps the current picture, or assigns a random avatar on first insert.
    pub profile_pic: Option<String>,
}
