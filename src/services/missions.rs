use std::sync::Arc;
use tracing::{info, warn};

use super::errors::unknown_cat;
use super::{ServiceError, CAT_BUSY};
use crate::models::{Mission, MissionDraft, MissionUpdate, Status};
use crate::store::{Store, StoreTx};

const MISSION_NOT_FOUND: &str = "there is no mission with that ID";
const TARGETS_PENDING: &str = "all targets must be completed before completing the mission";

/// Mission lifecycle: creation with targets, assignment, completion, deletion
pub struct MissionService {
    store: Arc<dyn Store>,
}

impl MissionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a mission and its 1-3 targets, all `in_progress`, atomically.
    pub async fn create(&self, draft: MissionDraft) -> Result<Mission, ServiceError> {
        draft.validate().map_err(ServiceError::InvalidInput)?;
        crate::time_operation!("mission_create");

        let mut tx = self.store.begin().await?;
        if let Some(cat_id) = draft.cat_id {
            if !tx.cat_available(cat_id).await? {
                warn!(cat_id, "Rejected mission for busy cat");
                return Err(ServiceError::Conflict(CAT_BUSY.into()));
            }
        }

        let mut mission = tx
            .insert_mission(draft.cat_id, Status::InProgress)
            .await
            .map_err(unknown_cat)?;
        for target in &draft.targets {
            // any failure here drops the transaction and with it the mission row
            let stored = tx
                .insert_target(mission.id, target, Status::InProgress)
                .await?;
            mission.targets.push(stored);
        }
        tx.commit().await?;

        info!(
            mission_id = mission.id,
            cat_id = ?mission.cat_id,
            targets = mission.targets.len(),
            "Mission created"
        );
        Ok(mission)
    }

    /// Delete an unassigned mission together with its targets.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.mission_assigned(id).await? {
            return Err(ServiceError::InvalidOperation(
                "cannot delete a mission assigned to a cat".into(),
            ));
        }
        if !tx.delete_mission(id).await? {
            return Err(ServiceError::NotFound(MISSION_NOT_FOUND.into()));
        }
        tx.commit().await?;

        info!(mission_id = id, "Mission deleted");
        Ok(())
    }

    /// Overwrite the cat reference and status of a mission.
    pub async fn update(&self, id: i64, update: MissionUpdate) -> Result<Mission, ServiceError> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .get_mission(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.into()))?;

        if current.status.is_completed() {
            return Err(ServiceError::InvalidOperation(
                "cannot update a completed mission".into(),
            ));
        }

        if let Some(cat_id) = update.cat_id {
            if current.cat_id != Some(cat_id) {
                if !tx.cat_exists(cat_id).await? {
                    return Err(ServiceError::InvalidInput(
                        "the specified cat does not exist".into(),
                    ));
                }
                if !tx.cat_available(cat_id).await? {
                    warn!(mission_id = id, cat_id, "Rejected reassignment to busy cat");
                    return Err(ServiceError::Conflict(CAT_BUSY.into()));
                }
            }
        }

        if update.status.is_completed() && !current.all_targets_completed() {
            return Err(ServiceError::InvalidOperation(TARGETS_PENDING.into()));
        }

        if !tx
            .update_mission(id, update.cat_id, update.status)
            .await
            .map_err(unknown_cat)?
        {
            return Err(ServiceError::NotFound(MISSION_NOT_FOUND.into()));
        }
        let mission = reload(tx.as_mut(), id).await?;
        tx.commit().await?;

        info!(mission_id = id, cat_id = ?mission.cat_id, status = %mission.status, "Mission updated");
        Ok(mission)
    }

    /// Mark a mission completed once every one of its targets is completed.
    pub async fn complete(&self, id: i64) -> Result<Mission, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mission = tx
            .get_mission(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.into()))?;

        if mission.status.is_completed() {
            return Err(ServiceError::InvalidOperation(
                "mission is already completed".into(),
            ));
        }
        if !mission.all_targets_completed() {
            return Err(ServiceError::InvalidOperation(TARGETS_PENDING.into()));
        }

        tx.complete_mission(id).await?;
        let mission = reload(tx.as_mut(), id).await?;
        tx.commit().await?;

        info!(mission_id = id, cat_id = ?mission.cat_id, "Mission completed");
        Ok(mission)
    }

    /// Put an available cat on an unassigned, still running mission.
    pub async fn assign_cat(&self, mission_id: i64, cat_id: i64) -> Result<Mission, ServiceError> {
        let mut tx = self.store.begin().await?;
        if !tx.cat_available(cat_id).await? {
            warn!(mission_id, cat_id, "Rejected assignment of busy cat");
            return Err(ServiceError::Conflict(CAT_BUSY.into()));
        }
        if tx.mission_assigned(mission_id).await? {
            return Err(ServiceError::InvalidOperation(
                "this mission is already assigned to a cat".into(),
            ));
        }
        if tx.mission_completed(mission_id).await? {
            return Err(ServiceError::InvalidOperation(
                "cannot assign a cat to a completed mission".into(),
            ));
        }
        if !tx
            .assign_cat(mission_id, cat_id)
            .await
            .map_err(unknown_cat)?
        {
            return Err(ServiceError::NotFound(MISSION_NOT_FOUND.into()));
        }
        let mission = reload(tx.as_mut(), mission_id).await?;
        tx.commit().await?;

        info!(mission_id, cat_id, "Cat assigned to mission");
        Ok(mission)
    }

    pub async fn list(&self) -> Result<Vec<Mission>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_missions().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Mission, ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.get_mission(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.into()))
    }
}

async fn reload(tx: &mut dyn StoreTx, id: i64) -> Result<Mission, ServiceError> {
    tx.get_mission(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.into()))
}
