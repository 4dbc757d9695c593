use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, MySqlPool};

use super::{StoreError, StoreResult, UserDirectory, UserScope, VacationStore};
use crate::model::{
    role::{Role, Visibility},
    user::{NewUser, User},
    vacation::{DateRange, VacationRecord, VacationStatus},
};
use crate::utils::email_index::{EmailIndex, Lookup};

/// MySQL integrity-constraint violation class (duplicate key).
const SQLSTATE_INTEGRITY: &str = "23000";

const USER_COLUMNS: &str = "id, email, password_hash, name, role, manager_id";

const VACATION_SELECT: &str = r#"
    SELECT
        v.id,
        v.user_id,
        u.name AS user_name,
        u.manager_id AS owner_manager_id,
        v.start_date,
        v.end_date,
        v.status
    FROM vacation_requests v
    JOIN users u ON u.id = v.user_id
"#;

#[derive(FromRow)]
struct UserRow {
    id: u64, // BIGINT UNSIGNED
    email: String,
    password_hash: String,
    name: String,
    role: String,
    manager_id: Option<u64>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("user {} has role '{}'", row.id, row.role)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role,
            manager_id: row.manager_id,
        })
    }
}

#[derive(FromRow)]
struct VacationRow {
    id: u64,
    user_id: u64,
    user_name: String,
    owner_manager_id: Option<u64>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
}

impl TryFrom<VacationRow> for VacationRecord {
    type Error = StoreError;

    fn try_from(row: VacationRow) -> Result<Self, Self::Error> {
        let status = VacationStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!("vacation {} has status '{}'", row.id, row.status))
        })?;
        let range = DateRange::new(row.start_date, row.end_date)
            .ok_or_else(|| StoreError::Corrupt(format!("vacation {} ends before it starts", row.id)))?;

        Ok(VacationRecord {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            owner_manager_id: row.owner_manager_id,
            range,
            status,
        })
    }
}

fn map_write_error(e: sqlx::Error, duplicate: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some(SQLSTATE_INTEGRITY) {
            return StoreError::Duplicate(duplicate.to_string());
        }
    }
    StoreError::Database(e)
}

fn users(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

fn vacations(rows: Vec<VacationRow>) -> StoreResult<Vec<VacationRecord>> {
    rows.into_iter().map(VacationRecord::try_from).collect()
}

pub struct MySqlStore {
    pool: MySqlPool,
    emails: EmailIndex,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            emails: EmailIndex::new(),
        }
    }

    pub fn emails(&self) -> &EmailIndex {
        &self.emails
    }
}

#[async_trait]
impl UserDirectory for MySqlStore {
    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        match self.emails.lookup(email).await {
            Lookup::Free => return Ok(false),
            Lookup::Taken => return Ok(true),
            Lookup::Unknown => {}
        }

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?
            > 0;

        if exists {
            self.emails.insert(email).await;
        }
        Ok(exists)
    }

    async fn list_users(&self, scope: UserScope) -> StoreResult<Vec<User>> {
        let rows = match scope {
            UserScope::All => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
                sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?
            }
            UserScope::ReportsOf(manager_id) => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE manager_id = ? ORDER BY id");
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(manager_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        users(rows)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, role, manager_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_ref())
        .bind(user.manager_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Email already exists"))?;

        self.emails.insert(&user.email).await;

        Ok(User {
            id: result.last_insert_id(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            manager_id: user.manager_id,
        })
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let previous: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, password_hash = ?, name = ?, role = ?, manager_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_ref())
        .bind(user.manager_id)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Email already exists"))?;

        if let Some((old,)) = previous {
            if old != user.email {
                self.emails.remove(&old).await;
                self.emails.insert(&user.email).await;
            }
        }
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(false);
        };

        // manager_id is declared ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.emails.remove(&user.email).await;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VacationStore for MySqlStore {
    async fn find_vacation(&self, id: u64) -> StoreResult<Option<VacationRecord>> {
        let sql = format!("{VACATION_SELECT} WHERE v.id = ?");
        sqlx::query_as::<_, VacationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(VacationRecord::try_from)
            .transpose()
    }

    async fn list_vacations(&self, visibility: Visibility) -> StoreResult<Vec<VacationRecord>> {
        let order = "ORDER BY v.start_date, v.id";
        let rows = match visibility {
            Visibility::Everyone => {
                let sql = format!("{VACATION_SELECT} {order}");
                sqlx::query_as::<_, VacationRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
            Visibility::TeamOf(manager_id) => {
                let sql = format!("{VACATION_SELECT} WHERE u.manager_id = ? {order}");
                sqlx::query_as::<_, VacationRow>(&sql)
                    .bind(manager_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            Visibility::OwnedBy(user_id) => {
                let sql = format!("{VACATION_SELECT} WHERE v.user_id = ? {order}");
                sqlx::query_as::<_, VacationRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        vacations(rows)
    }

    async fn approved_overlapping(
        &self,
        exclude_user: u64,
        range: DateRange,
    ) -> StoreResult<Vec<VacationRecord>> {
        let sql = format!(
            r#"{VACATION_SELECT}
            WHERE v.user_id <> ?
              AND v.status = ?
              AND v.start_date <= ?
              AND v.end_date >= ?
            ORDER BY v.start_date, v.id"#
        );
        let rows = sqlx::query_as::<_, VacationRow>(&sql)
            .bind(exclude_user)
            .bind(VacationStatus::Approved.as_ref())
            .bind(range.end())
            .bind(range.start())
            .fetch_all(&self.pool)
            .await?;
        vacations(rows)
    }

    async fn count_vacations_of(&self, user_id: u64) -> StoreResult<u64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vacation_requests WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total.max(0) as u64)
    }

    async fn insert_vacation(&self, user_id: u64, range: DateRange) -> StoreResult<VacationRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO vacation_requests (user_id, start_date, end_date, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(range.start())
        .bind(range.end())
        .bind(VacationStatus::Pending.as_ref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_vacation(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("vacation {id} vanished after insert")))
    }

    async fn set_vacation_status(&self, id: u64, status: VacationStatus) -> StoreResult<bool> {
        // rows_affected is 0 for a same-value update, so existence is checked separately
        if self.find_vacation(id).await?.is_none() {
            return Ok(false);
        }
        sqlx::query("UPDATE vacation_requests SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn delete_vacation(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM vacation_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
