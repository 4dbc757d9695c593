use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::{WriteGate, resolve_caller};
use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{
        role::Role,
        vacation::{DateRange, VacationRecord, VacationStatus},
    },
    store::Store,
};

pub struct VacationService {
    store: Arc<dyn Store>,
    gate: WriteGate,
}

impl VacationService {
    pub fn new(store: Arc<dyn Store>, gate: WriteGate) -> Self {
        Self { store, gate }
    }

    /// Files a PENDING request for the caller. Fails with `Conflict` when
    /// another user's approved vacation intersects the range.
    pub async fn create(
        &self,
        auth: &AuthUser,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<VacationRecord, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let range = DateRange::new(start, end)
            .ok_or_else(|| AppError::invalid("Start date must be before end date"))?;

        let _guard = self.gate.lock().await;

        let overlapping = self.store.approved_overlapping(caller.id, range).await?;
        if let Some(first) = overlapping.first() {
            debug!(
                user_id = caller.id,
                blocking_id = first.id,
                blocking_user = first.user_id,
                "Vacation overlaps an approved one"
            );
            return Err(AppError::conflict(
                "Vacation dates overlap with existing approved vacations",
            ));
        }

        let created = self.store.insert_vacation(caller.id, range).await?;
        info!(vacation_id = created.id, user_id = caller.id, "Vacation requested");
        Ok(created)
    }

    pub async fn list(&self, auth: &AuthUser) -> Result<Vec<VacationRecord>, AppError> {
        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        Ok(self
            .store
            .list_vacations(caller.role.visibility(caller.id))
            .await?)
    }

    pub async fn approve(&self, auth: &AuthUser, id: u64) -> Result<VacationRecord, AppError> {
        self.review(auth, id, VacationStatus::Approved).await
    }

    pub async fn reject(&self, auth: &AuthUser, id: u64) -> Result<VacationRecord, AppError> {
        self.review(auth, id, VacationStatus::Rejected).await
    }

    /// Sets the target status unconditionally once the caller is allowed;
    /// repeating a decision, or flipping it, is not an error.
    async fn review(
        &self,
        auth: &AuthUser,
        id: u64,
        status: VacationStatus,
    ) -> Result<VacationRecord, AppError> {
        let _guard = self.gate.lock().await;

        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let vacation = self
            .store
            .find_vacation(id)
            .await?
            .ok_or_else(|| AppError::not_found("Vacation not found"))?;

        if !caller.role.can_review(caller.id, vacation.owner_manager_id) {
            return Err(match caller.role {
                Role::Collaborator => AppError::forbidden("Collaborators cannot review vacations"),
                _ => AppError::forbidden("You can only review your team's vacations"),
            });
        }

        if !self.store.set_vacation_status(id, status).await? {
            return Err(AppError::not_found("Vacation not found"));
        }
        info!(vacation_id = id, reviewer = caller.id, %status, "Vacation reviewed");

        Ok(VacationRecord { status, ..vacation })
    }

    pub async fn delete(&self, auth: &AuthUser, id: u64) -> Result<(), AppError> {
        let _guard = self.gate.lock().await;

        let caller = resolve_caller(self.store.as_ref(), auth).await?;
        let vacation = self
            .store
            .find_vacation(id)
            .await?
            .ok_or_else(|| AppError::not_found("Vacation not found"))?;

        if !caller.role.can_delete(caller.id, vacation.user_id) {
            return Err(AppError::forbidden("You can only delete your own vacations"));
        }

        if !self.store.delete_vacation(id).await? {
            return Err(AppError::not_found("Vacation not found"));
        }
        info!(vacation_id = id, deleted_by = caller.id, "Vacation deleted");
        Ok(())
    }
}
