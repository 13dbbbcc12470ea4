//! studypath-client — Hosted-backend integrations.
//!
//! Implements typed access to the hosted relational backend: table CRUD
//! with filters and ordering, blob storage buckets, the score change feed,
//! and configuration loading. The backend itself (persistence, auth, row
//! security) is an opaque remote collaborator.

pub mod config;
pub mod realtime;
pub mod rest;
pub mod storage;
pub mod store;

pub use config::{load_config, load_config_from, BackendConfig, StudypathConfig};
pub use realtime::ScoreWatcher;
pub use rest::RestClient;
pub use storage::StorageClient;
pub use store::RestProgressStore;
