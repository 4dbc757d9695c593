//! End-to-end checks through the real router, auth middleware included,
//! against the in-memory store. Rate limiting is left out because test
//! requests carry no peer address.

use std::sync::Arc;

use actix_web::{
    App,
    http::StatusCode,
    middleware::from_fn,
    test,
    web::{self, Data},
};
use serde_json::{Value, json};

use crate::{
    auth::{auth::AuthUser, handlers, jwt::generate_access_token, middleware::auth_middleware},
    config::test_config,
    routes::{api_routes, json_config},
    service::{
        AppState,
        fixtures::{Org, org},
        seed::seed_demo_users,
    },
    store::memory::MemoryStore,
};

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($state))
                .app_data(Data::new(test_config()))
                .app_data(json_config())
                .service(web::resource("/auth/login").route(web::post().to(handlers::login)))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(api_routes),
                ),
        )
        .await
    };
}

fn bearer(user: &AuthUser) -> (&'static str, String) {
    let token = generate_access_token(
        user.user_id,
        user.email.clone(),
        user.role,
        &test_config().jwt_secret,
        900,
    )
    .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

fn june(start: u32, end: u32) -> Value {
    json!({
        "startDate": format!("2024-06-{start:02}"),
        "endDate": format!("2024-06-{end:02}"),
    })
}

async fn seeded_state() -> AppState {
    let store = Arc::new(MemoryStore::new());
    seed_demo_users(store.as_ref()).await.unwrap();
    AppState::new(store)
}

#[actix_web::test]
async fn login_then_me_round_trip() {
    let app = test_app!(seeded_state().await);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": " MANAGER@taskflow.com", "password": "manager123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "manager@taskflow.com");
    assert_eq!(body["role"], "MANAGER");
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["name"], "Manager User");
    assert_eq!(me["id"], body["userId"]);
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app!(seeded_state().await);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "user@taskflow.com", "password": "nope"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_web::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = test_app!(org().await.state);

    let req = test::TestRequest::get().uri("/api/vacations").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/vacations")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/vacations")
        .insert_header(("Authorization", "Token abc"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn approved_vacation_blocks_an_overlapping_request_from_another_team() {
    let Org {
        state,
        manager,
        alice,
        vera,
        ..
    } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .set_json(june(1, 5))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["startDate"], "2024-06-01");
    assert_eq!(created["userName"], "alice");

    let req = test::TestRequest::put()
        .uri(&format!("/api/vacations/{}/approve", created["id"]))
        .insert_header(bearer(&manager))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: Value = test::read_body_json(resp).await;
    assert_eq!(approved["status"], "APPROVED");

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&vera))
        .set_json(june(3, 4))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CONFLICT");
}

#[actix_web::test]
async fn bad_bodies_are_rejected_with_400() {
    let Org { state, alice, .. } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .set_json(june(5, 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Start date must be before end date");

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .set_json(json!({"startDate": "June 1st", "endDate": "2024-06-05"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID");
}

#[actix_web::test]
async fn review_rules_surface_as_403_and_404() {
    let Org {
        state, alice, bob, ..
    } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .set_json(june(1, 2))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/vacations/{}/reject", created["id"]))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri("/api/vacations/9999/approve")
        .insert_header(bearer(&bob))
        .to_request();
    // existence is checked before permissions
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn owners_delete_their_requests() {
    let Org { state, alice, .. } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .set_json(june(10, 12))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/vacations/{}", created["id"]))
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/vacations")
        .insert_header(bearer(&alice))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([]));
}

#[actix_web::test]
async fn only_admins_manage_accounts() {
    let Org {
        state,
        admin,
        manager,
        alice,
        ..
    } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let new_user = json!({
        "email": "nina@x.io",
        "password": "secret1",
        "name": "Nina",
        "role": "COLLABORATOR",
        "managerId": manager.user_id,
    });

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&manager))
        .set_json(&new_user)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(&new_user)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["managerId"], manager.user_id);
    assert!(created.get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(&new_user)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&manager))
        .to_request();
    let team: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(team.as_array().map(Vec::len), Some(3));
}

#[actix_web::test]
async fn users_with_vacations_cannot_be_deleted() {
    let Org {
        state, admin, bob, ..
    } = org().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/vacations")
        .insert_header(bearer(&bob))
        .set_json(june(20, 21))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", bob.user_id))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}
