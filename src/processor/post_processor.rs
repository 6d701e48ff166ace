use crate::artifact::types::Artifact;
use crate::configuration::config::Config;
use crate::error_handling::types::ProcessError;
use crate::store::consul::ConsulClient;
use crate::store::kv_store::KvStore;
use crate::ui::Ui;
use log::{debug, error, info};

/// Records the snapshot of each finished build in a key-value store.
///
/// The processor owns an immutable [`Config`] and an explicitly constructed
/// store client. Each [`PostProcessor::post_process`] call is independent:
/// origin check, identifier extraction, key derivation, one write.
pub struct PostProcessor<S: KvStore> {
    config: Config,
    store: S,
}

/// Outcome of a failed [`PostProcessor::post_process`] call.
///
/// `artifact` is handed back when the host may still keep it (store
/// failures); it is `None` when the artifact itself was rejected.
#[derive(Debug)]
pub struct PostProcessFailure<'a, A: ?Sized> {
    pub artifact: Option<&'a A>,
    pub error: ProcessError,
}

impl<A: ?Sized> PostProcessFailure<'_, A> {
    /// Always false: a failed artifact is never marked as kept.
    pub fn keep(&self) -> bool {
        false
    }
}

/// `Ok` carries the unmodified artifact with keep = true.
pub type PostProcessResult<'a, A> = Result<&'a A, PostProcessFailure<'a, A>>;

impl PostProcessor<ConsulClient> {
    /// Builds the Consul client from `config` and wraps it.
    pub fn connect(config: Config) -> Result<Self, ProcessError> {
        let client_config = config.store_client_config();
        let client = ConsulClient::new(&client_config).map_err(|e| {
            error!("Unable to create the Consul client: {}", e);
            ProcessError::StoreClient(e)
        })?;
        Ok(Self::new(config, client))
    }
}

impl<S: KvStore> PostProcessor<S> {
    pub fn new(config: Config, store: S) -> Self {
        debug!(
            "PostProcessor created for {} writing to {}",
            config.artifact_parser.builder_id(),
            store.describe()
        );
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn post_process<'a, A>(&self, ui: &dyn Ui, artifact: &'a A) -> PostProcessResult<'a, A>
    where
        A: Artifact + ?Sized,
    {
        info!("Post processing artifact: {}", artifact.describe());

        let parser = self.config.artifact_parser;
        if artifact.builder_id() != parser.builder_id() {
            error!(
                "Unknown artifact type {} (expected {})",
                artifact.builder_id(),
                parser.builder_id()
            );
            return Err(PostProcessFailure {
                artifact: None,
                error: ProcessError::UnsupportedArtifact(artifact.builder_id().to_string()),
            });
        }

        let snapshot_ids = parser.parse(artifact.id()).map_err(|error| {
            error!("Error: {}", error);
            PostProcessFailure {
                artifact: None,
                error,
            }
        })?;

        let key = self.config.store_key();
        let value = snapshot_ids.store_value();
        debug!("Writing to {}", self.store.describe());
        ui.message(&format!("Putting key {} with value {} in Consul...", key, value));

        match self.store.put(&key, value.as_bytes()).await {
            Ok(()) => {
                info!("Snapshot {} recorded under {}", value, key);
                Ok(artifact)
            }
            Err(e) => {
                error!("Unable to put key {}: {}", key, e);
                Err(PostProcessFailure {
                    artifact: Some(artifact),
                    error: ProcessError::StoreWrite(e),
                })
            }
        }
    }
}
