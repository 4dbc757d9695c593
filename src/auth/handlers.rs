use crate::{
    api::user::UserResponse,
    auth::{auth::AuthUser, jwt::generate_access_token},
    config::Config,
    error::AppError,
    model::role::Role,
    models::LoginReqDto,
    service::AppState,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::invalid("Email and password are required"));
    }

    let account = state.users.authenticate(&user.email, &user.password).await?;
    debug!(user_id = account.id, "Password verified");

    let token = generate_access_token(
        account.id,
        account.email.clone(),
        account.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    info!(user_id = account.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user_id: account.id,
        email: account.email,
        name: account.name,
        role: account.role,
    }))
}

/// The caller's own account as currently stored.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let user = state.users.me(&auth).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
