use crate::api::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::api::vacation::{CreateVacation, VacationResponse};
use crate::auth::handlers::LoginResponse;
use crate::model::{role::Role, vacation::VacationStatus};
use crate::models::LoginReqDto;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Tracker API",
        version = "1.0.0",
        description = r#"
## Team Vacation Tracker

Collaborators request vacations, managers review the requests of their
direct reports, admins see and manage everything.

### Key Features
- **Vacation Requests**
  - Request a date range, list visible requests, approve, reject, delete
  - A request may not overlap another user's approved vacation
- **User Management**
  - Admins create, update and delete accounts and assign managers

### Security
Every endpoint except `/auth/login` requires a **JWT Bearer** token.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::vacation::create_vacation,
        crate::api::vacation::list_vacations,
        crate::api::vacation::approve_vacation,
        crate::api::vacation::reject_vacation,
        crate::api::vacation::delete_vacation,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            VacationStatus,
            CreateVacation,
            VacationResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign-in and current user"),
        (name = "Vacation", description = "Vacation request APIs"),
        (name = "User", description = "User management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/auth/me",
            "/api/vacations",
            "/api/vacations/{vacation_id}",
            "/api/vacations/{vacation_id}/approve",
            "/api/vacations/{vacation_id}/reject",
            "/api/users",
            "/api/users/{user_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
