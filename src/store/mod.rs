//! Persistence ports for the user directory and the vacation store.
//!
//! Services only see these traits. [`mysql::MySqlStore`] backs production,
//! [`memory::MemoryStore`] backs local runs without a database and the tests.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    role::Visibility,
    user::{NewUser, User},
    vacation::{DateRange, VacationRecord, VacationStatus},
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Duplicate(String),
    /// A stored value could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which users a directory listing returns.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UserScope {
    All,
    ReportsOf(u64),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: u64) -> StoreResult<Option<User>>;

    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn email_taken(&self, email: &str) -> StoreResult<bool>;

    async fn list_users(&self, scope: UserScope) -> StoreResult<Vec<User>>;

    async fn count_users(&self) -> StoreResult<u64>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Overwrites every mutable field of an existing user.
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Removes the user and detaches their reports. Returns false when no
    /// such user exists.
    async fn delete_user(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait VacationStore: Send + Sync {
    async fn find_vacation(&self, id: u64) -> StoreResult<Option<VacationRecord>>;

    /// Ordered by start date, then id.
    async fn list_vacations(&self, visibility: Visibility) -> StoreResult<Vec<VacationRecord>>;

    /// Approved requests of users other than `exclude_user` that intersect
    /// `range` (inclusive bounds).
    async fn approved_overlapping(
        &self,
        exclude_user: u64,
        range: DateRange,
    ) -> StoreResult<Vec<VacationRecord>>;

    async fn count_vacations_of(&self, user_id: u64) -> StoreResult<u64>;

    /// Stores a new PENDING request.
    async fn insert_vacation(&self, user_id: u64, range: DateRange) -> StoreResult<VacationRecord>;

    async fn set_vacation_status(&self, id: u64, status: VacationStatus) -> StoreResult<bool>;

    async fn delete_vacation(&self, id: u64) -> StoreResult<bool>;
}

/// Both ports behind one handle, so a single adapter can serve joins.
pub trait Store: UserDirectory + VacationStore {}

impl<T: UserDirectory + VacationStore> Store for T {}
