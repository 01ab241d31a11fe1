use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "jdoe@company.com", format = "email")]
    pub email: String,
    pub password: String,
}

/// Login accepts either the username or the email as identifier.
#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Username.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}
