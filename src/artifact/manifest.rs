//! Reader for the JSON build manifest written by Packer's `manifest`
//! post-processor.

use super::id_parser::{AMAZON_EBS_BUILDER_ID, DIGITALOCEAN_BUILDER_ID};
use super::types::BuildArtifact;
use crate::error_handling::types::ManifestError;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct PackerManifest {
    #[serde(default)]
    pub builds: Vec<ManifestBuild>,
    pub last_run_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestBuild {
    pub name: Option<String>,
    pub builder_type: String,
    #[serde(default)]
    pub build_time: i64,
    #[serde(default)]
    pub files: Option<Vec<ManifestFile>>,
    pub artifact_id: String,
    pub packer_run_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Maps a manifest `builder_type` to the id reported by the builder's artifacts.
/// Unknown types are passed through unchanged.
pub fn builder_id_for_type(builder_type: &str) -> String {
    match builder_type {
        "digitalocean" => DIGITALOCEAN_BUILDER_ID.to_string(),
        "amazon-ebs" => AMAZON_EBS_BUILDER_ID.to_string(),
        other => other.to_string(),
    }
}

impl PackerManifest {
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let manifest = Self::from_json(&content)?;
        info!(
            "Loaded manifest {} with {} build(s)",
            path.display(),
            manifest.builds.len()
        );
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        let manifest: PackerManifest = serde_json::from_str(content)?;
        if manifest.builds.is_empty() {
            return Err(ManifestError::Empty);
        }
        Ok(manifest)
    }

    /// Artifacts in manifest order, optionally restricted to the last run.
    pub fn artifacts(&self, last_run_only: bool) -> Vec<BuildArtifact> {
        let last_run = if last_run_only {
            if self.last_run_uuid.is_none() {
                warn!("Manifest has no last_run_uuid, keeping every build");
            }
            self.last_run_uuid
        } else {
            None
        };

        self.builds
            .iter()
            .filter(|build| match last_run {
                Some(run) => build.packer_run_uuid == Some(run),
                None => true,
            })
            .map(|build| {
                debug!(
                    "Manifest build {:?} of type {}: {}",
                    build.name, build.builder_type, build.artifact_id
                );
                build.to_artifact()
            })
            .collect()
    }
}

impl ManifestBuild {
    pub fn build_time(&self) -> Option<DateTime<Utc>> {
        if self.build_time <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.build_time, 0)
    }

    pub fn to_artifact(&self) -> BuildArtifact {
        BuildArtifact {
            builder_id: builder_id_for_type(&self.builder_type),
            id: self.artifact_id.clone(),
            name: self.name.clone(),
            files: self
                .files
                .iter()
                .flatten()
                .map(|f| f.name.clone())
                .collect(),
            build_time: self.build_time(),
        }
    }
}
