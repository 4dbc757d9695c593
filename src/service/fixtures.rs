//! Shared fixtures: a small organisation backed by the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    auth::auth::AuthUser,
    model::{role::Role, user::NewUser},
    service::AppState,
    store::{UserDirectory, memory::MemoryStore},
};

pub fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

pub struct Org {
    pub state: AppState,
    pub admin: AuthUser,
    pub manager: AuthUser,
    pub other_manager: AuthUser,
    /// reports to `manager`
    pub alice: AuthUser,
    /// reports to `manager`
    pub bob: AuthUser,
    /// reports to `other_manager`
    pub vera: AuthUser,
}

async fn add(store: &MemoryStore, email: &str, role: Role, manager: Option<&AuthUser>) -> AuthUser {
    let user = store
        .insert_user(NewUser {
            email: email.into(),
            password_hash: "unused".into(),
            name: email.split('@').next().unwrap().into(),
            role,
            manager_id: manager.map(|m| m.user_id),
        })
        .await
        .unwrap();
    AuthUser {
        user_id: user.id,
        email: user.email,
        role,
    }
}

pub async fn org() -> Org {
    let store = Arc::new(MemoryStore::new());
    let admin = add(&store, "admin@x.io", Role::Admin, None).await;
    let manager = add(&store, "manager@x.io", Role::Manager, None).await;
    let other_manager = add(&store, "other@x.io", Role::Manager, None).await;
    let alice = add(&store, "alice@x.io", Role::Collaborator, Some(&manager)).await;
    let bob = add(&store, "bob@x.io", Role::Collaborator, Some(&manager)).await;
    let vera = add(&store, "vera@x.io", Role::Collaborator, Some(&other_manager)).await;

    Org {
        state: AppState::new(store),
        admin,
        manager,
        other_manager,
        alice,
        bob,
        vera,
    }
}
