// In-memory persistence gateway for tests and local experiments
//
// A transaction holds the store lock for its whole lifetime and works on a
// private copy of the state; commit swaps the copy in. Transactions are
// therefore fully serialized, and an uncommitted one leaves no trace.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, StoreTx};
use crate::models::{Cat, Mission, NewCat, Status, Target, TargetDraft, TargetUpdate};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    cats: BTreeMap<i64, Cat>,
    missions: BTreeMap<i64, Mission>,
    targets: BTreeMap<i64, Target>,
    last_cat_id: i64,
    last_mission_id: i64,
    last_target_id: i64,
}

impl MemoryState {
    fn hydrate(&self, mission: &Mission) -> Mission {
        let mut mission = mission.clone();
        mission.targets = self
            .targets
            .values()
            .filter(|t| t.mission_id == mission.id)
            .cloned()
            .collect();
        mission
    }

    fn check_cat_reference(&self, cat_id: Option<i64>) -> Result<(), StoreError> {
        match cat_id {
            Some(id) if !self.cats.contains_key(&id) => Err(StoreError::ForeignKeyViolation(
                format!("missions.cat_id references unknown cat {id}"),
            )),
            _ => Ok(()),
        }
    }

    /// Mirrors the partial unique index on `missions(cat_id) WHERE status = 'in_progress'`
    fn check_single_active_mission(
        &self,
        mission_id: i64,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<(), StoreError> {
        let Some(cat_id) = cat_id else {
            return Ok(());
        };
        if status.is_completed() {
            return Ok(());
        }
        let clash = self.missions.values().any(|m| {
            m.id != mission_id && m.cat_id == Some(cat_id) && m.status == Status::InProgress
        });
        if clash {
            Err(StoreError::UniqueViolation(format!(
                "cat {cat_id} already has an in_progress mission"
            )))
        } else {
            Ok(())
        }
    }
}

/// Gateway that keeps every row in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            committed: false,
        }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    committed: bool,
}

impl MemoryTx {
    fn state(&mut self) -> Result<&mut MemoryState, StoreError> {
        if self.committed {
            Err(StoreError::TransactionClosed)
        } else {
            Ok(&mut self.working)
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn list_cats(&mut self) -> Result<Vec<Cat>, StoreError> {
        Ok(self.state()?.cats.values().cloned().collect())
    }

    async fn get_cat(&mut self, id: i64) -> Result<Option<Cat>, StoreError> {
        Ok(self.state()?.cats.get(&id).cloned())
    }

    async fn insert_cat(&mut self, cat: &NewCat) -> Result<Cat, StoreError> {
        let state = self.state()?;
        state.last_cat_id += 1;
        let now = Utc::now();
        let stored = Cat {
            id: state.last_cat_id,
            name: cat.name.clone(),
            years_of_experience: cat.years_of_experience,
            breed: cat.breed.clone(),
            salary: cat.salary,
            created_at: now,
            updated_at: now,
        };
        state.cats.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_cat_salary(&mut self, id: i64, salary: f64) -> Result<bool, StoreError> {
        match self.state()?.cats.get_mut(&id) {
            Some(cat) => {
                cat.salary = salary;
                cat.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cat(&mut self, id: i64) -> Result<bool, StoreError> {
        let state = self.state()?;
        if state.cats.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for mission in state.missions.values_mut() {
            if mission.cat_id == Some(id) {
                mission.cat_id = None;
            }
        }
        Ok(true)
    }

    async fn cat_exists(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.state()?.cats.contains_key(&id))
    }

    async fn cat_available(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(!self
            .state()?
            .missions
            .values()
            .any(|m| m.cat_id == Some(id) && m.status == Status::InProgress))
    }

    async fn insert_mission(
        &mut self,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<Mission, StoreError> {
        let state = self.state()?;
        state.check_cat_reference(cat_id)?;
        state.check_single_active_mission(0, cat_id, status)?;
        state.last_mission_id += 1;
        let now = Utc::now();
        let mission = Mission {
            id: state.last_mission_id,
            cat_id,
            status,
            targets: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.missions.insert(mission.id, mission.clone());
        Ok(mission)
    }

    async fn list_missions(&mut self) -> Result<Vec<Mission>, StoreError> {
        let state = self.state()?;
        let mut missions: Vec<Mission> = state.missions.values().map(|m| state.hydrate(m)).collect();
        missions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(missions)
    }

    async fn get_mission(&mut self, id: i64) -> Result<Option<Mission>, StoreError> {
        let state = self.state()?;
        Ok(state.missions.get(&id).map(|m| state.hydrate(m)))
    }

    async fn update_mission(
        &mut self,
        id: i64,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<bool, StoreError> {
        let state = self.state()?;
        if !state.missions.contains_key(&id) {
            return Ok(false);
        }
        state.check_cat_reference(cat_id)?;
        state.check_single_active_mission(id, cat_id, status)?;
        if let Some(mission) = state.missions.get_mut(&id) {
            mission.cat_id = cat_id;
            mission.status = status;
            mission.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn complete_mission(&mut self, id: i64) -> Result<bool, StoreError> {
        match self.state()?.missions.get_mut(&id) {
            Some(mission) => {
                mission.status = Status::Completed;
                mission.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn assign_cat(&mut self, mission_id: i64, cat_id: i64) -> Result<bool, StoreError> {
        let state = self.state()?;
        let Some(status) = state.missions.get(&mission_id).map(|m| m.status) else {
            return Ok(false);
        };
        state.check_cat_reference(Some(cat_id))?;
        state.check_single_active_mission(mission_id, Some(cat_id), status)?;
        if let Some(mission) = state.missions.get_mut(&mission_id) {
            mission.cat_id = Some(cat_id);
            mission.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn delete_mission(&mut self, id: i64) -> Result<bool, StoreError> {
        let state = self.state()?;
        if state.missions.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE CASCADE
        state.targets.retain(|_, t| t.mission_id != id);
        Ok(true)
    }

    async fn mission_assigned(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .missions
            .get(&id)
            .is_some_and(|m| m.cat_id.is_some()))
    }

    async fn mission_completed(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .missions
            .get(&id)
            .is_some_and(|m| m.status.is_completed()))
    }

    async fn insert_target(
        &mut self,
        mission_id: i64,
        draft: &TargetDraft,
        status: Status,
    ) -> Result<Target, StoreError> {
        let state = self.state()?;
        if !state.missions.contains_key(&mission_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "targets.mission_id references unknown mission {mission_id}"
            )));
        }
        state.last_target_id += 1;
        let now = Utc::now();
        let target = Target {
            id: state.last_target_id,
            mission_id,
            name: draft.name.clone(),
            country: draft.country.clone(),
            notes: draft.notes.clone(),
            status,
            created_at: now,
            updated_at: now,
        };
        state.targets.insert(target.id, target.clone());
        Ok(target)
    }

    async fn get_target(&mut self, id: i64) -> Result<Option<Target>, StoreError> {
        Ok(self.state()?.targets.get(&id).cloned())
    }

    async fn count_targets(&mut self, mission_id: i64) -> Result<usize, StoreError> {
        Ok(self
            .state()?
            .targets
            .values()
            .filter(|t| t.mission_id == mission_id)
            .count())
    }

    async fn update_target(&mut self, update: &TargetUpdate) -> Result<bool, StoreError> {
        match self.state()?.targets.get_mut(&update.id) {
            Some(target) if target.mission_id == update.mission_id => {
                target.name = update.name.clone();
                target.country = update.country.clone();
                target.notes = update.notes.clone();
                target.status = update.status;
                target.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_target_notes(&mut self, id: i64, notes: &str) -> Result<bool, StoreError> {
        match self.state()?.targets.get_mut(&id) {
            Some(target) => {
                target.notes = notes.to_string();
                target.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_target(
        &mut self,
        mission_id: i64,
        target_id: i64,
    ) -> Result<bool, StoreError> {
        match self.state()?.targets.get_mut(&target_id) {
            Some(target) if target.mission_id == mission_id => {
                target.status = Status::Completed;
                target.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_target(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError> {
        let state = self.state()?;
        let linked = state
            .targets
            .get(&target_id)
            .is_some_and(|t| t.mission_id == mission_id);
        if linked {
            state.targets.remove(&target_id);
        }
        Ok(linked)
    }

    async fn target_linked(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .targets
            .get(&target_id)
            .is_some_and(|t| t.mission_id == mission_id))
    }

    async fn target_completed(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .targets
            .get(&id)
            .is_some_and(|t| t.status.is_completed()))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::TransactionClosed);
        }
        *self.guard = std::mem::take(&mut self.working);
        self.committed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> TargetDraft {
        TargetDraft {
            name: name.to_string(),
            country: "FR".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_leaves_no_trace() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            let mission = tx.insert_mission(None, Status::InProgress).await.unwrap();
            tx.insert_target(mission.id, &draft("A"), Status::InProgress)
                .await
                .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_missions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_committed_mission_is_hydrated() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mission = tx.insert_mission(None, Status::InProgress).await.unwrap();
        tx.insert_target(mission.id, &draft("A"), Status::InProgress)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        let stored = tx.get_mission(mission.id).await.unwrap().unwrap();
        assert_eq!(stored.targets.len(), 1);
        assert_eq!(stored.targets[0].name, "A");
    }

    #[tokio::test]
    async fn test_unknown_cat_is_a_foreign_key_violation() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_mission(Some(42), Status::InProgress).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_delete_mission_cascades_targets() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mission = tx.insert_mission(None, Status::InProgress).await.unwrap();
        let target = tx
            .insert_target(mission.id, &draft("A"), Status::InProgress)
            .await
            .unwrap();
        assert!(tx.delete_mission(mission.id).await.unwrap());
        assert!(tx.get_target(target.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_twice_is_rejected() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
        assert!(matches!(
            tx.commit().await,
            Err(StoreError::TransactionClosed)
        ));
        assert!(matches!(
            tx.list_cats().await,
            Err(StoreError::TransactionClosed)
        ));
    }
}
