use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::vacation::{VacationRecord, VacationStatus},
    service::AppState,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVacation {
    #[schema(example = "2024-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": 3,
    "userName": "Collaborator User",
    "startDate": "2024-06-01",
    "endDate": "2024-06-05",
    "status": "PENDING"
}))]
pub struct VacationResponse {
    pub id: u64,
    /// owner of the request
    pub user_id: u64,
    pub user_name: String,
    #[schema(example = "2024-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: VacationStatus,
}

impl From<VacationRecord> for VacationResponse {
    fn from(record: VacationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            user_name: record.user_name,
            start_date: record.range.start(),
            end_date: record.range.end(),
            status: record.status,
        }
    }
}

/* =========================
Create vacation request
========================= */
#[utoipa::path(
    post,
    path = "/api/vacations",
    request_body(
        content = CreateVacation,
        description = "Vacation date range, both days included",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Vacation requested", body = VacationResponse),
        (status = 400, description = "Start date after end date or malformed body"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps another user's approved vacation")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn create_vacation(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateVacation>,
) -> Result<HttpResponse, AppError> {
    let created = state
        .vacations
        .create(&auth, payload.start_date, payload.end_date)
        .await?;

    Ok(HttpResponse::Created().json(VacationResponse::from(created)))
}

/// Role-filtered listing: admins see everything, managers their team,
/// collaborators their own requests.
#[utoipa::path(
    get,
    path = "/api/vacations",
    responses(
        (status = 200, description = "Visible vacation requests", body = [VacationResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
pub async fn list_vacations(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let vacations: Vec<VacationResponse> = state
        .vacations
        .list(&auth)
        .await?
        .into_iter()
        .map(VacationResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(vacations))
}

/* =========================
Approve vacation (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/vacations/{vacation_id}/approve",
    params(
        ("vacation_id" = u64, Path, description = "ID of the vacation request to approve")
    ),
    responses(
        (status = 200, description = "Vacation approved", body = VacationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not review this request"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn approve_vacation(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let vacation = state.vacations.approve(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(VacationResponse::from(vacation)))
}

/* =========================
Reject vacation (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/vacations/{vacation_id}/reject",
    params(
        ("vacation_id" = u64, Path, description = "ID of the vacation request to reject")
    ),
    responses(
        (status = 200, description = "Vacation rejected", body = VacationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not review this request"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn reject_vacation(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let vacation = state.vacations.reject(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(VacationResponse::from(vacation)))
}

#[utoipa::path(
    delete,
    path = "/api/vacations/{vacation_id}",
    params(
        ("vacation_id" = u64, Path, description = "ID of the vacation request to delete")
    ),
    responses(
        (status = 204, description = "Vacation deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Collaborators may delete only their own requests"),
        (status = 404, description = "Vacation request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Vacation"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, email = %auth.email, role = %auth.role))]
pub async fn delete_vacation(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    state.vacations.delete(&auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
