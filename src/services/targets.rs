use std::sync::Arc;
use tracing::{info, warn};

use super::{ServiceError, TARGET_NOT_LINKED};
use crate::models::{Status, Target, TargetDraft, TargetUpdate, MAX_TARGETS, MIN_TARGETS};
use crate::store::{Store, StoreTx};

const TARGET_NOT_FOUND: &str = "there is no target with that ID";
const MISSION_NOT_FOUND: &str = "there is no mission with that ID";

/// Target lifecycle, always scoped to the owning mission
pub struct TargetService {
    store: Arc<dyn Store>,
}

impl TargetService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Overwrite name, country, notes and status of a target.
    pub async fn update(&self, update: TargetUpdate) -> Result<Target, ServiceError> {
        update.validate().map_err(ServiceError::InvalidInput)?;

        let mut tx = self.store.begin().await?;
        let stored = tx
            .get_target(update.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TARGET_NOT_FOUND.into()))?;
        if stored.mission_id != update.mission_id {
            return Err(ServiceError::InvalidInput(TARGET_NOT_LINKED.into()));
        }
        if tx.mission_completed(update.mission_id).await? {
            return Err(ServiceError::InvalidOperation(
                "cannot update target of a completed mission".into(),
            ));
        }
        if stored.status.is_completed() {
            return Err(ServiceError::InvalidOperation(
                "cannot update a completed target".into(),
            ));
        }

        if !tx.update_target(&update).await? {
            return Err(ServiceError::NotFound(TARGET_NOT_FOUND.into()));
        }
        let target = reload(tx.as_mut(), update.id).await?;
        tx.commit().await?;

        info!(target_id = target.id, mission_id = target.mission_id, status = %target.status, "Target updated");
        Ok(target)
    }

    /// Replace only the notes of a running target.
    pub async fn update_notes(&self, id: i64, notes: &str) -> Result<Target, ServiceError> {
        let mut tx = self.store.begin().await?;
        let target = reload(tx.as_mut(), id).await?;

        if !tx.target_linked(target.mission_id, target.id).await? {
            return Err(ServiceError::InvalidInput(TARGET_NOT_LINKED.into()));
        }
        if tx.mission_completed(target.mission_id).await? {
            return Err(ServiceError::InvalidOperation(
                "cannot update notes of a target in a completed mission".into(),
            ));
        }
        if target.status.is_completed() {
            return Err(ServiceError::Conflict(
                "cannot update notes of a completed target".into(),
            ));
        }

        tx.update_target_notes(id, notes).await?;
        let target = reload(tx.as_mut(), id).await?;
        tx.commit().await?;

        info!(target_id = id, mission_id = target.mission_id, "Target notes updated");
        Ok(target)
    }

    /// Mark one target of a running mission completed.
    pub async fn complete(&self, mission_id: i64, target_id: i64) -> Result<Target, ServiceError> {
        let mut tx = self.store.begin().await?;
        if !tx.target_linked(mission_id, target_id).await? {
            return Err(ServiceError::InvalidInput(TARGET_NOT_LINKED.into()));
        }
        if tx.mission_completed(mission_id).await? {
            return Err(ServiceError::Conflict(
                "cannot complete a target of an already completed mission".into(),
            ));
        }
        if tx.target_completed(target_id).await? {
            return Err(ServiceError::InvalidOperation(
                "target is already completed".into(),
            ));
        }

        tx.complete_target(mission_id, target_id).await?;
        let target = reload(tx.as_mut(), target_id).await?;
        tx.commit().await?;

        info!(target_id, mission_id, "Target completed");
        Ok(target)
    }

    /// Remove a running target, keeping at least one on the mission.
    pub async fn delete(&self, mission_id: i64, target_id: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.target_completed(target_id).await? {
            return Err(ServiceError::InvalidOperation(
                "cannot delete a completed target".into(),
            ));
        }
        if !tx.target_linked(mission_id, target_id).await? {
            return Err(ServiceError::InvalidInput(TARGET_NOT_LINKED.into()));
        }
        if tx.count_targets(mission_id).await? <= MIN_TARGETS {
            warn!(target_id, mission_id, "Refused to delete last target");
            return Err(ServiceError::Conflict(
                "cannot delete the last target of a mission".into(),
            ));
        }

        tx.delete_target(mission_id, target_id).await?;
        tx.commit().await?;

        info!(target_id, mission_id, "Target deleted");
        Ok(())
    }

    /// Attach a new `in_progress` target to a running mission.
    pub async fn add(&self, mission_id: i64, draft: TargetDraft) -> Result<Target, ServiceError> {
        draft.validate().map_err(ServiceError::InvalidInput)?;

        let mut tx = self.store.begin().await?;
        let mission = tx
            .get_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.into()))?;
        if mission.status.is_completed() {
            return Err(ServiceError::InvalidOperation(
                "cannot add target to a completed mission".into(),
            ));
        }
        if mission.targets.len() >= MAX_TARGETS {
            warn!(mission_id, "Refused to add target beyond limit");
            return Err(ServiceError::Conflict(format!(
                "a mission cannot have more than {MAX_TARGETS} targets"
            )));
        }

        let target = tx
            .insert_target(mission_id, &draft, Status::InProgress)
            .await?;
        tx.commit().await?;

        info!(target_id = target.id, mission_id, "Target added");
        Ok(target)
    }
}

async fn reload(tx: &mut dyn StoreTx, id: i64) -> Result<Target, ServiceError> {
    tx.get_target(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(TARGET_NOT_FOUND.into()))
}
