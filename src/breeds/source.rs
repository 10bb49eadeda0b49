use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Error)]
pub enum BreedLookupError {
    #[error("breed lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("breed lookup returned HTTP {0}")]
    UnexpectedStatus(u16),
}

/// Where the list of recognised cat breeds comes from
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait BreedSource: Send + Sync {
    async fn list_breed_names(&self) -> Result<Vec<String>, BreedLookupError>;
}

#[derive(Debug, Deserialize)]
struct BreedRecord {
    name: String,
}

/// Client for a TheCatAPI-compatible `/v1/breeds` endpoint
#[derive(Debug, Clone)]
pub struct TheCatApiSource {
    client: reqwest::Client,
    url: String,
}

impl TheCatApiSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BreedLookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spy-cat-agency/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BreedSource for TheCatApiSource {
    async fn list_breed_names(&self) -> Result<Vec<String>, BreedLookupError> {
        debug!(url = %self.url, "Fetching breed list");
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BreedLookupError::UnexpectedStatus(status.as_u16()));
        }
        let records: Vec<BreedRecord> = response.json().await?;
        Ok(records.into_iter().map(|r| r.name).collect())
    }
}
