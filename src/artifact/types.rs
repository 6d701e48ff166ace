use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output handle of a build step.
///
/// Artifacts are owned by the host; post-processing only inspects them and
/// hands the same reference back.
pub trait Artifact: fmt::Debug + Send + Sync {
    /// Identifier of the builder that produced the artifact.
    fn builder_id(&self) -> &str;

    /// Builder-specific identifier string, e.g. `nyc3:12345678`.
    fn id(&self) -> &str;

    fn files(&self) -> &[String] {
        &[]
    }

    /// Human-readable summary shown to the user.
    fn describe(&self) -> String {
        format!("{} artifact {}", self.builder_id(), self.id())
    }
}

/// Artifact read from a build manifest or given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub builder_id: String,
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    pub build_time: Option<DateTime<Utc>>,
}

impl BuildArtifact {
    pub fn new(builder_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            builder_id: builder_id.into(),
            id: id.into(),
            name: None,
            files: Vec::new(),
            build_time: None,
        }
    }
}

impl Artifact for BuildArtifact {
    fn builder_id(&self) -> &str {
        &self.builder_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn files(&self) -> &[String] {
        &self.files
    }

    fn describe(&self) -> String {
        let mut text = match &self.name {
            Some(name) => format!("{} ({}): {}", name, self.builder_id, self.id),
            None => format!("{}: {}", self.builder_id, self.id),
        };
        if let Some(at) = self.build_time {
            text.push_str(&format!(", built {}", at.to_rfc3339()));
        }
        text
    }
}
