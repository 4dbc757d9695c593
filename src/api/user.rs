use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{role::Role, user::User},
    service::{
        AppState,
        user::{AccountChanges, NewAccount},
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "jane@taskflow.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "changeme")]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub role: Role,
    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,
}

impl From<CreateUserRequest> for NewAccount {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            name: req.name,
            role: req.role,
            manager_id: req.manager_id,
        }
    }
}

/// Every field is optional; absent fields keep their value.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub manager_id: Option<u64>,
}

impl From<UpdateUserRequest> for AccountChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            name: req.name,
            role: req.role,
            manager_id: req.manager_id,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 3,
    "email": "user@taskflow.com",
    "name": "Collaborator User",
    "role": "COLLABORATOR",
    "managerId": 2
}))]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub manager_id: Option<u64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            manager_id: user.manager_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users for admins, the team for managers", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Collaborators cannot list users")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let users: Vec<UserResponse> = state
        .users
        .list(&auth)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user = state.users.get(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Create User (Admin)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Blank field or malformed email"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Manager not found"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn create_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state.users.create(&auth, payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Update User
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Blank field or malformed email"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User or manager not found"),
        (status = 409, description = "Email already exists or manager cycle")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn update_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .update(&auth, path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete User (Admin)
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns vacation requests")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn delete_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    state.users.delete(&auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
