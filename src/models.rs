use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "manager@taskflow.com")]
    pub email: String,
    #[schema(example = "manager123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email at issue time
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
