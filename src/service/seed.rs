use anyhow::{Result, anyhow};
use tracing::info;

use crate::{
    auth::password::hash_password,
    model::{role::Role, user::NewUser},
    store::Store,
};

struct DemoAccount {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

const ADMIN: DemoAccount = DemoAccount {
    email: "admin@taskflow.com",
    password: "admin123",
    name: "Admin User",
    role: Role::Admin,
};

const MANAGER: DemoAccount = DemoAccount {
    email: "manager@taskflow.com",
    password: "manager123",
    name: "Manager User",
    role: Role::Manager,
};

const COLLABORATOR: DemoAccount = DemoAccount {
    email: "user@taskflow.com",
    password: "user123",
    name: "Collaborator User",
    role: Role::Collaborator,
};

fn new_user(account: &DemoAccount, manager_id: Option<u64>) -> Result<NewUser> {
    Ok(NewUser {
        email: account.email.to_string(),
        password_hash: hash_password(account.password)
            .map_err(|e| anyhow!("hashing demo password failed: {e}"))?,
        name: account.name.to_string(),
        role: account.role,
        manager_id,
    })
}

/// Creates an admin, a manager and one collaborator reporting to that
/// manager, but only when the directory is empty. Returns whether anything
/// was written.
pub async fn seed_demo_users(store: &dyn Store) -> Result<bool> {
    if store.count_users().await? > 0 {
        return Ok(false);
    }

    store.insert_user(new_user(&ADMIN, None)?).await?;
    let manager = store.insert_user(new_user(&MANAGER, None)?).await?;
    store
        .insert_user(new_user(&COLLABORATOR, Some(manager.id))?)
        .await?;

    info!("Seeded demo users");
    Ok(true)
}
