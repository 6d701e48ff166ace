use std::fmt;
use thiserror::Error;

/// A single field-level configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingField(String),
    #[error("Invalid Consul scheme: {0}")]
    InvalidScheme(String),
    #[error("Invalid Consul address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("Invalid key format: {0} (expected \"path\" or \"suffix\")")]
    InvalidKeyFormat(String),
    #[error("Unsupported builder id: {0}")]
    UnsupportedBuilder(String),
    #[error("{field} must not contain \".\" or \"..\" key segments: {value}")]
    DotSegment { field: String, value: String },
    #[error("Error processing {field}: {reason}")]
    Template { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error("TOML parsing error: {0}")]
    Toml(String),
    #[error("JSON parsing error: {0}")]
    Json(String),
}

impl ConfigError {
    /// Name of the offending configuration key, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingField(field)
            | ConfigError::Template { field, .. }
            | ConfigError::DotSegment { field, .. } => Some(field),
            ConfigError::InvalidScheme(_) => Some("consul_scheme"),
            ConfigError::InvalidAddress { .. } => Some("consul_address"),
            ConfigError::InvalidKeyFormat(_) => Some("key_format"),
            ConfigError::UnsupportedBuilder(_) => Some("builder_id"),
            ConfigError::Io(_) | ConfigError::Toml(_) | ConfigError::Json(_) => None,
        }
    }
}

/// Every configuration problem found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigErrors {
    errors: Vec<ConfigError>,
}

impl ConfigErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// True when one of the collected errors concerns `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == Some(field))
    }

    /// `Ok(value)` when nothing was collected, the aggregate otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ConfigErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} error(s) occurred:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Failures talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unable to read {path}: {source}")]
    TlsMaterial {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TLS setup failed: {0}")]
    Tls(String),
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Store refused to write key {0}")]
    Rejected(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Why a single artifact could not be recorded.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Unknown artifact type: {0}")]
    UnsupportedArtifact(String),
    #[error("Error: imageID has invalid format: {0}")]
    MalformedArtifactId(String),
    #[error("Unable to create the Consul client: {0}")]
    StoreClient(#[source] StoreError),
    #[error("Unable to put the snapshot in Consul: {0}")]
    StoreWrite(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Unable to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Manifest parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest contains no builds")]
    Empty,
}

/// Top-level error of the command-line host.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigErrors),
    #[error("{0}")]
    Manifest(#[from] ManifestError),
    #[error("{0}")]
    Process(#[from] ProcessError),
    #[error("Invalid arguments: {0}")]
    Arguments(String),
    #[error("{failed} of {total} artifact(s) could not be recorded")]
    Incomplete { failed: usize, total: usize },
}
