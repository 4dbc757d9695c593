use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::lock::Mutex;

use super::{StoreError, StoreResult, UserDirectory, UserScope, VacationStore};
use crate::model::{
    role::Visibility,
    user::{NewUser, User},
    vacation::{DateRange, VacationRecord, VacationStatus},
};

#[derive(Debug, Clone)]
struct StoredVacation {
    user_id: u64,
    range: DateRange,
    status: VacationStatus,
}

#[derive(Debug, Default)]
struct Tables {
    next_user_id: u64,
    next_vacation_id: u64,
    users: BTreeMap<u64, User>,
    vacations: BTreeMap<u64, StoredVacation>,
}

impl Tables {
    fn record(&self, id: u64, vacation: &StoredVacation) -> StoreResult<VacationRecord> {
        let owner = self
            .users
            .get(&vacation.user_id)
            .ok_or_else(|| StoreError::Corrupt(format!("vacation {id} has no owner")))?;

        Ok(VacationRecord {
            id,
            user_id: owner.id,
            user_name: owner.name.clone(),
            owner_manager_id: owner.manager_id,
            range: vacation.range,
            status: vacation.status,
        })
    }

    fn records(&self, keep: impl Fn(&VacationRecord) -> bool) -> StoreResult<Vec<VacationRecord>> {
        let mut out = Vec::new();
        for (id, vacation) in &self.vacations {
            let record = self.record(*id, vacation)?;
            if keep(&record) {
                out.push(record);
            }
        }
        out.sort_by_key(|r| (r.range.start(), r.id));
        Ok(out)
    }

    fn email_in_use(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Process-local store with the same semantics as the MySQL tables,
/// including the unique email index and the manager `ON DELETE SET NULL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        Ok(self.tables.lock().await.email_in_use(email, None))
    }

    async fn list_users(&self, scope: UserScope) -> StoreResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .filter(|u| match scope {
                UserScope::All => true,
                UserScope::ReportsOf(manager) => u.manager_id == Some(manager),
            })
            .cloned()
            .collect())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.tables.lock().await.users.len() as u64)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.email_in_use(&user.email, None) {
            return Err(StoreError::Duplicate("Email already exists".into()));
        }

        tables.next_user_id += 1;
        let stored = User {
            id: tables.next_user_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            manager_id: user.manager_id,
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.email_in_use(&user.email, Some(user.id)) {
            return Err(StoreError::Duplicate("Email already exists".into()));
        }
        if let Some(slot) = tables.users.get_mut(&user.id) {
            *slot = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        for report in tables.users.values_mut() {
            if report.manager_id == Some(id) {
                report.manager_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl VacationStore for MemoryStore {
    async fn find_vacation(&self, id: u64) -> StoreResult<Option<VacationRecord>> {
        let tables = self.tables.lock().await;
        tables
            .vacations
            .get(&id)
            .map(|v| tables.record(id, v))
            .transpose()
    }

    async fn list_vacations(&self, visibility: Visibility) -> StoreResult<Vec<VacationRecord>> {
        let tables = self.tables.lock().await;
        tables.records(move |r| match visibility {
            Visibility::Everyone => true,
            Visibility::TeamOf(manager) => r.owner_manager_id == Some(manager),
            Visibility::OwnedBy(owner) => r.user_id == owner,
        })
    }

    async fn approved_overlapping(
        &self,
        exclude_user: u64,
        range: DateRange,
    ) -> StoreResult<Vec<VacationRecord>> {
        let tables = self.tables.lock().await;
        tables.records(move |r| {
            r.user_id != exclude_user
                && r.status == VacationStatus::Approved
                && r.range.overlaps(&range)
        })
    }

    async fn count_vacations_of(&self, user_id: u64) -> StoreResult<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .vacations
            .values()
            .filter(|v| v.user_id == user_id)
            .count() as u64)
    }

    async fn insert_vacation(&self, user_id: u64, range: DateRange) -> StoreResult<VacationRecord> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Corrupt(format!("user {user_id} does not exist")));
        }

        tables.next_vacation_id += 1;
        let id = tables.next_vacation_id;
        let stored = StoredVacation {
            user_id,
            range,
            status: VacationStatus::Pending,
        };
        let record = tables.record(id, &stored)?;
        tables.vacations.insert(id, stored);
        Ok(record)
    }

    async fn set_vacation_status(&self, id: u64, status: VacationStatus) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.vacations.get_mut(&id) {
            Some(vacation) => {
                vacation.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_vacation(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables.lock().await.vacations.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use chrono::NaiveDate;

    fn new_user(email: &str, manager_id: Option<u64>) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            name: email.into(),
            role: Role::Collaborator,
            manager_id,
        }
    }

    fn june(a: u32, b: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, a).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, b).unwrap(),
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.io", None)).await.unwrap();
        let err = store.insert_user(new_user("a@x.io", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[actix_web::test]
    async fn deleting_a_manager_detaches_reports() {
        let store = MemoryStore::new();
        let boss = store.insert_user(new_user("m@x.io", None)).await.unwrap();
        let report = store.insert_user(new_user("u@x.io", Some(boss.id))).await.unwrap();

        assert!(store.delete_user(boss.id).await.unwrap());
        let report = store.find_user(report.id).await.unwrap().unwrap();
        assert_eq!(report.manager_id, None);
        assert!(!store.delete_user(boss.id).await.unwrap());
    }

    #[actix_web::test]
    async fn overlap_query_only_sees_other_users_approved_requests() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@x.io", None)).await.unwrap();
        let b = store.insert_user(new_user("b@x.io", None)).await.unwrap();

        let mine = store.insert_vacation(a.id, june(1, 5)).await.unwrap();
        let theirs = store.insert_vacation(b.id, june(4, 8)).await.unwrap();
        assert!(store.approved_overlapping(a.id, june(3, 3)).await.unwrap().is_empty());

        store.set_vacation_status(mine.id, VacationStatus::Approved).await.unwrap();
        store.set_vacation_status(theirs.id, VacationStatus::Approved).await.unwrap();

        let hits = store.approved_overlapping(a.id, june(3, 4)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, theirs.id);
        assert_eq!(hits[0].user_name, "b@x.io");
    }

    #[actix_web::test]
    async fn listing_is_ordered_by_start_date() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@x.io", None)).await.unwrap();
        let late = store.insert_vacation(a.id, june(20, 21)).await.unwrap();
        let early = store.insert_vacation(a.id, june(2, 3)).await.unwrap();

        let ids: Vec<u64> = store
            .list_vacations(Visibility::OwnedBy(a.id))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }
}
