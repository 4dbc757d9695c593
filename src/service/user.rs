use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::{WriteGate, resolve_caller};
use crate::{
    auth::{
        auth::AuthUser,
        password::{hash_password, verify_password},
    },
    error::AppError,
    model::{
        role::Role,
        user::{NewUser, User, looks_like_email, normalize_email},
    },
    store::{Store, UserScope},
};

/// Input for a new account, password still in clear text.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub manager_id: Option<u64>,
}

/// Partial update: `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub manager_id: Option<u64>,
}

fn valid_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if looks_like_email(&email) {
        Ok(email)
    } else {
        Err(AppError::invalid("Email is not a valid address"))
    }
}

fn non_blank<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::invalid(format!("{field} must not be empty")))
    } else {
        Ok(trimmed)
    }
}

fn hashed(password: &str) -> Result<String, AppError> {
    let password = non_blank(password, "password")?;
    hash_password(password)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub struct UserService {
    store: Arc<dyn Store>,
    gate: WriteGate,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, gate: WriteGate) -> Self {
        Self { store, gate }
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self.store.find_user_by_email(&normalize_email(email)).await?;
        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => Err(AppError::unauthorized("Invalid credentials")),
        }
    }

    pub async fn me(&self, auth: &AuthUser) -> Result<User, AppError> {
        resolve_caller(self.store.as_ref(), auth).await
    }

    pub async fn list(&self, auth: &AuthUser) -> Result<Vec<User>, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let scope = match caller.role {
            Role::Admin => UserScope::All,
            Role::Manager => UserScope::ReportsOf(caller.id),
            Role::Collaborator => return Err(AppError::forbidden("Collaborators cannot list users")),
        };
        Ok(self.store.list_users(scope).await?)
    }

    pub async fn get(&self, auth: &AuthUser, id: u64) -> Result<User, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let user = self.find(id).await?;
        if !caller.role.can_view_user(caller.id, user.id, user.manager_id) {
            return Err(AppError::forbidden("You cannot view this user"));
        }
        Ok(user)
    }

    pub async fn create(&self, auth: &AuthUser, account: NewAccount) -> Result<User, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        if !caller.role.can_administer_users() {
            return Err(AppError::forbidden("Only admins can create users"));
        }

        let email = valid_email(&account.email)?;
        let name = non_blank(&account.name, "name")?.to_string();
        let password_hash = hashed(&account.password)?;

        let _guard = self.gate.lock().await;

        if self.store.email_taken(&email).await? {
            return Err(AppError::conflict("Email already exists"));
        }
        if let Some(manager_id) = account.manager_id {
            self.find_manager(manager_id).await?;
        }

        let user = self
            .store
            .insert_user(NewUser {
                email,
                password_hash,
                name,
                role: account.role,
                manager_id: account.manager_id,
            })
            .await?;
        info!(user_id = user.id, role = %user.role, created_by = caller.id, "User created");
        Ok(user)
    }

    /// Admins may change anything; everyone else only their own name,
    /// email and password.
    pub async fn update(
        &self,
        auth: &AuthUser,
        id: u64,
        changes: AccountChanges,
    ) -> Result<User, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let is_admin = caller.role.can_administer_users();
        if !is_admin && caller.id != id {
            return Err(AppError::forbidden("You can only update your own account"));
        }
        if !is_admin && (changes.role.is_some() || changes.manager_id.is_some()) {
            return Err(AppError::forbidden("Only admins can change role or manager"));
        }

        let email = changes.email.as_deref().map(valid_email).transpose()?;
        let name = changes
            .name
            .as_deref()
            .map(|n| non_blank(n, "name").map(str::to_string))
            .transpose()?;
        let password_hash = changes.password.as_deref().map(hashed).transpose()?;

        let _guard = self.gate.lock().await;

        let mut user = self.find(id).await?;

        if let Some(email) = email {
            if email != user.email {
                if self.store.email_taken(&email).await? {
                    return Err(AppError::conflict("Email already exists"));
                }
                user.email = email;
            }
        }
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(manager_id) = changes.manager_id {
            self.ensure_acyclic(user.id, manager_id).await?;
            user.manager_id = Some(manager_id);
        }

        self.store.save_user(&user).await?;
        info!(user_id = user.id, updated_by = caller.id, "User updated");
        Ok(user)
    }

    /// Users who still own vacation requests cannot be removed.
    pub async fn delete(&self, auth: &AuthUser, id: u64) -> Result<(), AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        if !caller.role.can_administer_users() {
            return Err(AppError::forbidden("Only admins can delete users"));
        }

        let _guard = self.gate.lock().await;

        self.find(id).await?;
        if self.store.count_vacations_of(id).await? > 0 {
            return Err(AppError::conflict(
                "Cannot delete user with existing vacation requests",
            ));
        }
        if !self.store.delete_user(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id = id, deleted_by = caller.id, "User deleted");
        Ok(())
    }

    async fn find(&self, id: u64) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn find_manager(&self, id: u64) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("Manager not found"))
    }

    /// Walks up the chain from the proposed manager; reaching `user_id`
    /// again means the link would close a loop.
    async fn ensure_acyclic(&self, user_id: u64, manager_id: u64) -> Result<(), AppError> {
        if user_id == manager_id {
            return Err(AppError::conflict("A user cannot manage themselves"));
        }

        let mut seen = HashSet::from([user_id]);
        let mut current = Some(self.find_manager(manager_id).await?);
        while let Some(user) = current {
            if !seen.insert(user.id) {
                return Err(AppError::conflict("Manager assignment would create a cycle"));
            }
            current = match user.manager_id {
                Some(next) => self.store.find_user(next).await?,
                None => None,
            };
        }
        Ok(())
    }
}
