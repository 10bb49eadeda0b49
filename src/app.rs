use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, AppState};
use crate::breeds::BreedCatalog;
use crate::config::SpyCatConfig;
use crate::database::DatabaseManager;
use crate::services::{CatService, MissionService, TargetService};
use crate::shutdown::shutdown_all_services;
use crate::store::{SqliteStore, Store};

/// Wire the lifecycle services onto a store and a breed catalog
pub fn app_state(store: Arc<dyn Store>, breeds: Arc<BreedCatalog>) -> AppState {
    AppState {
        cats: Arc::new(CatService::new(store.clone(), breeds)),
        missions: Arc::new(MissionService::new(store.clone())),
        targets: Arc::new(TargetService::new(store)),
    }
}

/// A fully wired service, ready to be bound to a listener
pub struct Application {
    database: DatabaseManager,
    state: AppState,
}

impl Application {
    pub async fn build(config: &SpyCatConfig) -> Result<Self> {
        let database = DatabaseManager::new(&config.database)
            .await
            .context("failed to open database")?;
        let breeds = BreedCatalog::from_config(&config.breeds)
            .context("failed to build breed lookup client")?;

        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(database.pool().clone()));
        let state = app_state(store, Arc::new(breeds));
        Ok(Self { database, state })
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then drain and release resources
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(%addr, "Spy Cat Agency listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        shutdown_all_services(&self.database).await;
        Ok(())
    }
}
