pub mod types;

pub use types::{AppError, ConfigError, ConfigErrors, ManifestError, ProcessError, StoreError};
