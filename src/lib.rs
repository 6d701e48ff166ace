//! kvsnap records freshly built snapshot identifiers in the Consul key-value
//! store.
//!
//! A run configures once ([`configuration::Config::from_raws`]) and then
//! post-processes every artifact ([`processor::PostProcessor::post_process`]),
//! writing one key per artifact.

pub mod artifact;
pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod processor;
pub mod store;
pub mod ui;

pub use artifact::{Artifact, BuildArtifact};
pub use configuration::{Config, RawConfig};
pub use controller::Controller;
pub use error_handling::{AppError, ConfigError, ConfigErrors, ProcessError, StoreError};
pub use processor::PostProcessor;
pub use store::{ConsulClient, KvStore, MemoryStore};
pub use ui::{ConsoleUi, Ui};
