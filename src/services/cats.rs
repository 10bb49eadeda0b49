use std::sync::Arc;
use tracing::{info, warn};

use super::ServiceError;
use crate::breeds::BreedCatalog;
use crate::models::cat::validate_salary;
use crate::models::{Cat, NewCat};
use crate::store::Store;

const CAT_NOT_FOUND: &str = "there is no cat with that ID";
const INVALID_BREED: &str =
    "invalid breed: the provided breed does not match any known cat breeds";

/// Agent catalog: hiring, salary changes and dismissal of spy cats
pub struct CatService {
    store: Arc<dyn Store>,
    breeds: Arc<BreedCatalog>,
}

impl CatService {
    pub fn new(store: Arc<dyn Store>, breeds: Arc<BreedCatalog>) -> Self {
        Self { store, breeds }
    }

    pub async fn create(&self, cat: NewCat) -> Result<Cat, ServiceError> {
        cat.validate().map_err(ServiceError::InvalidInput)?;

        // upstream lookup happens before the transaction is opened
        if !self.breeds.is_known_breed(&cat.breed).await {
            warn!(breed = %cat.breed, "Rejected unknown breed");
            return Err(ServiceError::InvalidInput(INVALID_BREED.into()));
        }

        let mut tx = self.store.begin().await?;
        let stored = tx.insert_cat(&cat).await?;
        tx.commit().await?;

        info!(cat_id = stored.id, breed = %stored.breed, "Cat hired");
        Ok(stored)
    }

    pub async fn get(&self, id: i64) -> Result<Cat, ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.get_cat(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(CAT_NOT_FOUND.into()))
    }

    /// All cats, ordered by id
    pub async fn list(&self) -> Result<Vec<Cat>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_cats().await?)
    }

    /// Salary is the only mutable attribute of a cat.
    pub async fn update_salary(&self, id: i64, salary: f64) -> Result<Cat, ServiceError> {
        validate_salary(salary).map_err(ServiceError::InvalidInput)?;

        let mut tx = self.store.begin().await?;
        if !tx.update_cat_salary(id, salary).await? {
            return Err(ServiceError::NotFound(CAT_NOT_FOUND.into()));
        }
        let cat = tx
            .get_cat(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(CAT_NOT_FOUND.into()))?;
        tx.commit().await?;

        info!(cat_id = id, salary, "Cat salary updated");
        Ok(cat)
    }

    /// Dismiss a cat; its missions become unassigned.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_cat(id).await? {
            return Err(ServiceError::NotFound(CAT_NOT_FOUND.into()));
        }
        tx.commit().await?;

        info!(cat_id = id, "Cat dismissed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breeds::{BreedCache, BreedLookupError, ManualClock, MockBreedSource};
    use crate::models::Status;
    use crate::store::InMemoryStore;

    fn catalog(known: &'static [&'static str]) -> Arc<BreedCatalog> {
        let mut source = MockBreedSource::new();
        source
            .expect_list_breed_names()
            .returning(move || Ok(known.iter().map(|s| s.to_string()).collect()));
        Arc::new(BreedCatalog::new(
            Arc::new(source),
            BreedCache::new(chrono::Duration::hours(24), Arc::new(ManualClock::default())),
        ))
    }

    fn service(store: &InMemoryStore) -> CatService {
        CatService::new(Arc::new(store.clone()), catalog(&["Bengal", "Sphynx"]))
    }

    fn bengal() -> NewCat {
        NewCat {
            name: "Shadow".to_string(),
            years_of_experience: 6,
            breed: "bengal".to_string(),
            salary: 2500.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let cats = service(&store);

        let created = cats.create(bengal()).await.unwrap();
        assert_eq!(created.name, "Shadow");

        let fetched = cats.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_unknown_breed_is_rejected() {
        let store = InMemoryStore::new();
        let cats = service(&store);

        let mut cat = bengal();
        cat.breed = "Griffin".to_string();
        match cats.create(cat).await.unwrap_err() {
            ServiceError::InvalidInput(msg) => assert_eq!(msg, INVALID_BREED),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(cats.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_breed_api_rejects() {
        let store = InMemoryStore::new();
        let mut source = MockBreedSource::new();
        source
            .expect_list_breed_names()
            .returning(|| Err(BreedLookupError::UnexpectedStatus(502)));
        let breeds = Arc::new(BreedCatalog::new(
            Arc::new(source),
            BreedCache::new(chrono::Duration::hours(24), Arc::new(ManualClock::default())),
        ));
        let cats = CatService::new(Arc::new(store), breeds);

        let err = cats.create(bengal()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_fields_skip_breed_lookup() {
        let store = InMemoryStore::new();
        let mut source = MockBreedSource::new();
        source.expect_list_breed_names().times(0);
        let breeds = Arc::new(BreedCatalog::new(
            Arc::new(source),
            BreedCache::new(chrono::Duration::hours(24), Arc::new(ManualClock::default())),
        ));
        let cats = CatService::new(Arc::new(store), breeds);

        let mut cat = bengal();
        cat.salary = 0.0;
        let err = cats.create(cat).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_salary() {
        let store = InMemoryStore::new();
        let cats = service(&store);
        let created = cats.create(bengal()).await.unwrap();

        let updated = cats.update_salary(created.id, 3100.5).await.unwrap();
        assert_eq!(updated.salary, 3100.5);
        assert_eq!(updated.name, created.name);

        assert!(matches!(
            cats.update_salary(created.id, -1.0).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
        assert!(matches!(
            cats.update_salary(999, 10.0).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_unassigns_missions() {
        let store = InMemoryStore::new();
        let cats = service(&store);
        let created = cats.create(bengal()).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mission = tx
            .insert_mission(Some(created.id), Status::InProgress)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        cats.delete(created.id).await.unwrap();
        assert!(matches!(
            cats.get(created.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));

        let mut tx = store.begin().await.unwrap();
        let mission = tx.get_mission(mission.id).await.unwrap().unwrap();
        assert_eq!(mission.cat_id, None);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = InMemoryStore::new();
        let cats = service(&store);
        let first = cats.create(bengal()).await.unwrap();
        let mut second = bengal();
        second.name = "Ghost".to_string();
        second.breed = "Sphynx".to_string();
        let second = cats.create(second).await.unwrap();

        let ids: Vec<i64> = cats.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_delete_unknown_cat() {
        let store = InMemoryStore::new();
        let err = service(&store).delete(5).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
