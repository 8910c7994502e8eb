//! Runtime bootstrap - exactly-once initialization of a served instance
//!
//! A process hosts one `Bootstrapper` for its whole lifetime. The first
//! caller of [`Bootstrapper::ready`] runs initialization; every caller,
//! concurrent or later, awaits the same memoized outcome. A failed
//! initialization is cached and re-raised to every waiter, so a broken
//! process fails every request deterministically until it is replaced.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use jsonbay_core::AppConfig;

use crate::auth::{ApiKeyStrategy, AuthStrategy, PublicStrategy};
use crate::storage::{FileStorageAdapter, ObjectStorageAdapter, StorageAdapter};

/// Environment variables consulted by [`ExecutionMode::from_env`].
pub const ENV_STORAGE_ENDPOINT: &str = "JSONBAY_STORAGE_ENDPOINT";
pub const ENV_STORAGE_BUCKET: &str = "JSONBAY_STORAGE_BUCKET";
pub const ENV_STORAGE_KEY: &str = "JSONBAY_STORAGE_KEY";
pub const ENV_JSON_FILE: &str = "JSONBAY_JSON_FILE";

const DEFAULT_JSON_FILE: &str = "db.json";

/// Memoized, clonable initialization failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Initialization failed ({stage}): {message}")]
pub struct InitializationFailure {
    /// Which part of setup failed (`storage` or `auth`)
    pub stage: &'static str,
    pub message: String,
}

impl InitializationFailure {
    fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Where a process runs, decided once at cold start
///
/// Passed explicitly into the bootstrapper; only binary entry points read
/// the ambient environment, via [`ExecutionMode::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Local run: the document lives in a file next to the process.
    Local { json_file: PathBuf },
    /// Deployed run: the document lives in object storage.
    Cloud {
        endpoint: String,
        bucket: String,
        key: String,
    },
}

impl ExecutionMode {
    /// Derive the mode from the process environment.
    ///
    /// Cloud when the full bucket binding is present, local otherwise.
    pub fn from_env() -> Self {
        let endpoint = std::env::var(ENV_STORAGE_ENDPOINT).ok();
        let bucket = std::env::var(ENV_STORAGE_BUCKET).ok();
        let key = std::env::var(ENV_STORAGE_KEY).ok();

        if let (Some(endpoint), Some(bucket), Some(key)) = (endpoint, bucket, key) {
            return ExecutionMode::Cloud {
                endpoint,
                bucket,
                key,
            };
        }

        let json_file = std::env::var(ENV_JSON_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_JSON_FILE));
        ExecutionMode::Local { json_file }
    }
}

/// Everything a request handler needs from a warmed-up process
pub struct BootstrapState {
    pub config: AppConfig,
    pub storage: Arc<dyn StorageAdapter>,
    pub auth: Arc<dyn AuthStrategy>,
}

impl std::fmt::Debug for BootstrapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Cold-start wiring for one process lifetime
pub struct Bootstrapper {
    config: AppConfig,
    mode: ExecutionMode,
    state: OnceCell<Result<Arc<BootstrapState>, InitializationFailure>>,
}

impl Bootstrapper {
    pub fn new(config: AppConfig, mode: ExecutionMode) -> Self {
        Self {
            config,
            mode,
            state: OnceCell::new(),
        }
    }

    /// Await the memoized setup outcome.
    ///
    /// Initialization runs at most once per process; all callers observe the
    /// identical resolved state or the identical failure.
    pub async fn ready(&self) -> Result<Arc<BootstrapState>, InitializationFailure> {
        self.state.get_or_init(|| self.initialize()).await.clone()
    }

    async fn initialize(&self) -> Result<Arc<BootstrapState>, InitializationFailure> {
        let storage: Arc<dyn StorageAdapter> = match &self.mode {
            ExecutionMode::Local { json_file } => {
                Arc::new(FileStorageAdapter::new(json_file.clone()))
            }
            ExecutionMode::Cloud {
                endpoint,
                bucket,
                key,
            } => Arc::new(ObjectStorageAdapter::new(endpoint, bucket, key)),
        };

        // One validating read; an unreachable or corrupt document must fail
        // the whole process, not individual requests later.
        storage
            .read()
            .await
            .map_err(|e| InitializationFailure::new("storage", e.to_string()))?;

        let auth: Arc<dyn AuthStrategy> = if self.config.enable_api_key_auth {
            let key_material = self.config.api_key.clone().unwrap_or_default();
            Arc::new(
                ApiKeyStrategy::new(key_material)
                    .map_err(|e| InitializationFailure::new("auth", e.to_string()))?,
            )
        } else {
            Arc::new(PublicStrategy)
        };

        tracing::info!(
            storage = %storage.location(),
            auth = auth.name(),
            "bootstrap complete"
        );

        Ok(Arc::new(BootstrapState {
            config: self.config.clone(),
            storage,
            auth,
        }))
    }
}
