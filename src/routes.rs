use crate::{
    api::{user, vacation},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct Limits {
    login: Limiter,
    protected: Limiter,
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("invalid rate limit: {requests_per_min} per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl Limits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

/// Malformed bodies (bad dates, unknown roles, missing fields) become 400s
/// with the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::invalid(format!("Invalid request body: {err}")).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &Limits) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limits.login.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limits.protected.clone()) // rate limiting
            .configure(api_routes),
    );
}

/// Everything that lives behind the bearer token, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/me").route(web::get().to(handlers::me)))
        .service(
            web::scope("/vacations")
                // /vacations
                .service(
                    web::resource("")
                        .route(web::get().to(vacation::list_vacations))
                        .route(web::post().to(vacation::create_vacation)),
                )
                // /vacations/{id}
                .service(
                    web::resource("/{id}").route(web::delete().to(vacation::delete_vacation)),
                )
                // /vacations/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .route(web::put().to(vacation::approve_vacation)),
                )
                // /vacations/{id}/reject
                .service(
                    web::resource("/{id}/reject").route(web::put().to(vacation::reject_vacation)),
                ),
        )
        .service(
            web::scope("/users")
                // /users
                .service(
                    web::resource("")
                        .route(web::get().to(user::list_users))
                        .route(web::post().to(user::create_user)),
                )
                // /users/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(user::get_user))
                        .route(web::put().to(user::update_user))
                        .route(web::delete().to(user::delete_user)),
                ),
        );
}
