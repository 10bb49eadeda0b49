// Breed catalog - validates cat breeds against an external list

pub mod cache;
pub mod source;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::BreedsConfig;
use crate::observability::breed_metrics;

pub use cache::{BreedCache, Clock, ManualClock, SystemClock};
pub use source::{BreedLookupError, BreedSource, TheCatApiSource};

#[cfg(any(test, feature = "testing"))]
pub use source::MockBreedSource;

/// Lowercased, trimmed form used for breed comparison
pub fn normalize_breed(breed: &str) -> String {
    breed.trim().to_lowercase()
}

/// Answers "is this a real cat breed?" from a cached upstream list
pub struct BreedCatalog {
    source: Arc<dyn BreedSource>,
    cache: BreedCache,
}

impl BreedCatalog {
    pub fn new(source: Arc<dyn BreedSource>, cache: BreedCache) -> Self {
        Self { source, cache }
    }

    /// Catalog backed by the configured HTTP endpoint and the system clock
    pub fn from_config(config: &BreedsConfig) -> Result<Self, BreedLookupError> {
        let source = TheCatApiSource::new(
            config.api_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        let cache = BreedCache::new(
            chrono::Duration::hours(config.cache_ttl_hours),
            Arc::new(SystemClock),
        );
        Ok(Self::new(Arc::new(source), cache))
    }

    /// Normalised breed names, served from cache while fresh
    pub async fn breed_names(&self) -> Result<Arc<HashSet<String>>, BreedLookupError> {
        let metrics = breed_metrics();
        if let Some(names) = self.cache.fresh().await {
            metrics.record_cache_hit();
            return Ok(names);
        }
        metrics.record_cache_miss();
        metrics.record_request();
        crate::time_operation!("breed_lookup");

        let names = match self.source.list_breed_names().await {
            Ok(names) => names,
            Err(e) => {
                metrics.record_error();
                return Err(e);
            }
        };
        let normalized: HashSet<String> = names.iter().map(|n| normalize_breed(n)).collect();
        debug!(breeds = normalized.len(), "Breed list refreshed");
        Ok(self.cache.store(normalized).await)
    }

    /// Whether `breed` matches a known breed. An unreachable upstream counts as "no".
    pub async fn is_known_breed(&self, breed: &str) -> bool {
        let known = match self.breed_names().await {
            Ok(names) => names.contains(&normalize_breed(breed)),
            Err(e) => {
                warn!(error = %e, breed, "Breed lookup failed, rejecting breed");
                false
            }
        };
        if !known {
            breed_metrics().record_rejection();
        }
        known
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}
