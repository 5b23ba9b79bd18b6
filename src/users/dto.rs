use serde::Serialize;
use uuid::Uuid;

use crate::users::model::User;

/// Public part of the user returned to the client. The `_id` wire name is
/// what the frontend keys on.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        }
    }
}
