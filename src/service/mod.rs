#[cfg(test)]
pub(crate) mod fixtures;
pub mod seed;
pub mod user;
pub mod vacation;

use std::sync::Arc;

use futures::lock::Mutex;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::user::User,
    store::Store,
};

/// Serializes every check-then-act write in the process: overlap check and
/// insert, authorization and status change, uniqueness and user writes.
pub type WriteGate = Arc<Mutex<()>>;

pub struct AppState {
    pub users: user::UserService,
    pub vacations: vacation::VacationService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let gate: WriteGate = Arc::new(Mutex::new(()));
        Self {
            users: user::UserService::new(store.clone(), gate.clone()),
            vacations: vacation::VacationService::new(store, gate),
        }
    }
}

/// The token only names the caller; role and manager come from the
/// directory so that changes apply without re-login.
async fn resolve_caller(store: &dyn Store, auth: &AuthUser) -> Result<User, AppError> {
    store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))
}
