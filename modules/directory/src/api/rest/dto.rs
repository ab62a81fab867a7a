use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{User, UserProfile};

/// Public user profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileReq {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchUsersQuery {
    /// Case-insensitive fragment of the email address.
    pub keyword: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            profile_pic: user.profile_pic,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<UpdateProfileReq> for UserProfile {
    fn from(req: UpdateProfileReq) -> Self {
        Self {
            email: req.email,
            full_name: req.full_name,
            profile_pic: req.profile_pic,
        }
    }
}
