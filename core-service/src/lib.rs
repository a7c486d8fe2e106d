//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! secure storage, clock) into the scheduler core and runs it. The desktop
//! binary enables the `desktop-shims` feature (which depends on
//! `bridge-desktop`) and calls [`bootstrap_desktop`]; tests hand in their own
//! bridges through [`bootstrap`].

pub mod error;
pub mod pipeline;
pub mod publish_time;
pub mod run;

pub use error::{Result, ServiceError};
pub use pipeline::{RecordOutcome, UploadPipeline};
pub use publish_time::{resolve_publish_at, TimeResolutionError};
pub use run::{
    RunOptions, RunOutcome, RunSummary, Scheduler, EXIT_ABORTED, EXIT_FAILURES,
    EXIT_INCOMPLETE, EXIT_OK,
};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    storage::{FileSystemAccess, SecureStore},
    time::Clock,
};
use core_auth::{CredentialCache, CredentialManager, GoogleIdentityProvider};
use core_library::{CsvMetadataStore, RandomTimeSlots};
use core_runtime::SchedulerConfig;
use provider_youtube::YouTubeConnector;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub secure_store: Arc<dyn SecureStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        filesystem: Arc<dyn FileSystemAccess>,
        secure_store: Arc<dyn SecureStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            filesystem,
            secure_store,
            clock,
        }
    }
}

/// Build a [`Scheduler`] from `config` and the given bridges.
///
/// The credential cache key lives in `deps.secure_store`; its location is
/// reported as the configured credential cache file.
pub fn bootstrap(config: SchedulerConfig, deps: CoreDependencies) -> Result<Scheduler> {
    config.validate()?;

    let store = Arc::new(CsvMetadataStore::new(
        deps.filesystem.clone(),
        config.metadata_file.clone(),
    ));

    let identity = GoogleIdentityProvider::new(
        deps.filesystem.clone(),
        deps.http_client.clone(),
        config.client_secrets_file.clone(),
        config.scopes.clone(),
    )
    .with_clock(deps.clock.clone());
    let cache = CredentialCache::new(
        deps.secure_store.clone(),
        config.credential_cache_file.display().to_string(),
    );
    let credentials = CredentialManager::new(Arc::new(identity), cache, deps.clock.clone());

    let connector =
        YouTubeConnector::with_base_url(deps.http_client.clone(), &config.upload.upload_base_url)
            .with_request_timeout(config.upload.request_timeout);

    let pipeline = UploadPipeline::new(
        deps.filesystem.clone(),
        connector,
        Arc::new(credentials),
        config.upload.clone(),
        config.video_folder.clone(),
        deps.clock.clone(),
    );

    let time_slots = Box::new(RandomTimeSlots::new(
        config.publish_window_start,
        config.publish_window_end,
    ));

    info!(
        video_folder = ?config.video_folder,
        metadata = ?config.metadata_file,
        "Scheduler initialized"
    );

    Ok(Scheduler::new(
        config,
        deps.filesystem,
        store,
        deps.clock,
        time_slots,
        pipeline,
    ))
}

/// Bootstrapper for desktop hosts: reqwest, tokio filesystem, file-backed
/// credential store and the system clock.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: SchedulerConfig) -> Result<Scheduler> {
    use bridge_desktop::{FileSecureStore, ReqwestHttpClient, TokioFileSystem};
    use bridge_traits::time::SystemClock;

    let http_client = ReqwestHttpClient::with_timeouts(
        config.upload.request_timeout,
        config.upload.connect_timeout,
    )?;
    let deps = CoreDependencies::new(
        Arc::new(http_client),
        Arc::new(TokioFileSystem::new()),
        Arc::new(FileSecureStore::new(config.credential_cache_file.clone())),
        Arc::new(SystemClock),
    );
    bootstrap(config, deps)
}
