// Spy Cat Agency - spy cats, their missions and mission targets over a REST API
// This exposes the core components for testing and integration

pub mod api;
pub mod app;
pub mod breeds;
pub mod config;
pub mod database;
pub mod models;
pub mod observability;
pub mod services;
pub mod shutdown;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use app::{app_state, Application};
pub use breeds::{BreedCatalog, BreedLookupError, BreedSource};
pub use config::SpyCatConfig;
pub use database::DatabaseManager;
pub use models::{Cat, Mission, Status, Target};
pub use observability::{breed_metrics, BreedLookupMetrics, OperationTimer};
pub use services::{CatService, MissionService, ServiceError, TargetService};
pub use store::{InMemoryStore, SqliteStore, Store, StoreError, StoreTx};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
