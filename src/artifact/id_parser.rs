//! Builder-specific artifact ID grammars.
//!
//! Each supported builder formats its artifact ID differently. The grammar is
//! picked from the builder id, never guessed from the string itself; adding a
//! builder means adding a variant here.

use crate::error_handling::types::ProcessError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DIGITALOCEAN_BUILDER_ID: &str = "pearkes.digitalocean";
pub const AMAZON_EBS_BUILDER_ID: &str = "mitchellh.amazonebs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactIdParser {
    /// `<region>:<snapshot-id>`
    DigitalOcean,
    /// `<region>:<ami>[,<region>:<ami>...]`
    AmazonEbs,
}

impl ArtifactIdParser {
    pub fn for_builder_id(builder_id: &str) -> Option<Self> {
        match builder_id {
            DIGITALOCEAN_BUILDER_ID => Some(ArtifactIdParser::DigitalOcean),
            AMAZON_EBS_BUILDER_ID => Some(ArtifactIdParser::AmazonEbs),
            _ => None,
        }
    }

    pub fn builder_id(&self) -> &'static str {
        match self {
            ArtifactIdParser::DigitalOcean => DIGITALOCEAN_BUILDER_ID,
            ArtifactIdParser::AmazonEbs => AMAZON_EBS_BUILDER_ID,
        }
    }

    /// Namespace under which snapshots of this builder are stored.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ArtifactIdParser::DigitalOcean => "snaps/do/",
            ArtifactIdParser::AmazonEbs => "snaps/aws/",
        }
    }

    pub fn parse(&self, artifact_id: &str) -> Result<SnapshotIds, ProcessError> {
        let malformed = || ProcessError::MalformedArtifactId(artifact_id.to_string());

        let entries: Vec<&str> = match self {
            ArtifactIdParser::DigitalOcean => vec![artifact_id],
            ArtifactIdParser::AmazonEbs => artifact_id.split(',').collect(),
        };

        let mut pairs = Vec::with_capacity(entries.len());
        for entry in entries {
            let segments: Vec<&str> = entry.split(':').collect();
            if segments.len() != 2 || segments[1].is_empty() {
                return Err(malformed());
            }
            pairs.push(RegionSnapshot {
                region: segments[0].to_string(),
                snapshot_id: segments[1].to_string(),
            });
        }

        Ok(SnapshotIds { pairs })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub region: String,
    pub snapshot_id: String,
}

/// Snapshot identifiers extracted from one artifact. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIds {
    pairs: Vec<RegionSnapshot>,
}

impl SnapshotIds {
    pub fn pairs(&self) -> &[RegionSnapshot] {
        &self.pairs
    }

    /// Value written to the store.
    ///
    /// A single snapshot is stored as its bare identifier; several regions are
    /// stored as a JSON object keyed by region.
    pub fn store_value(&self) -> String {
        if let [only] = self.pairs.as_slice() {
            return only.snapshot_id.clone();
        }
        let sorted: BTreeMap<&str, &str> = self
            .pairs
            .iter()
            .map(|p| (p.region.as_str(), p.snapshot_id.as_str()))
            .collect();
        let object: Map<String, Value> = sorted
            .into_iter()
            .map(|(region, id)| (region.to_string(), Value::String(id.to_string())))
            .collect();
        Value::Object(object).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digitalocean_id_yields_second_segment() {
        let ids = ArtifactIdParser::DigitalOcean.parse("nyc3:12345678").unwrap();
        assert_eq!(ids.store_value(), "12345678");
        assert_eq!(ids.pairs()[0].region, "nyc3");
    }

    #[test]
    fn digitalocean_rejects_three_segments() {
        let err = ArtifactIdParser::DigitalOcean.parse("a:b:c").unwrap_err();
        match err {
            ProcessError::MalformedArtifactId(id) => assert_eq!(id, "a:b:c"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn digitalocean_rejects_multi_region_list() {
        assert!(ArtifactIdParser::DigitalOcean
            .parse("nyc3:1,ams3:2")
            .is_err());
        assert!(ArtifactIdParser::DigitalOcean.parse("12345678").is_err());
        assert!(ArtifactIdParser::DigitalOcean.parse("nyc3:").is_err());
    }

    #[test]
    fn segments_are_taken_verbatim() {
        let ids = ArtifactIdParser::DigitalOcean.parse("nyc3: 123").unwrap();
        assert_eq!(ids.store_value(), " 123");
        assert_eq!(ids.pairs()[0].region, "nyc3");
    }

    #[test]
    fn amazon_single_region() {
        let ids = ArtifactIdParser::AmazonEbs
            .parse("us-east-1:ami-0abc")
            .unwrap();
        assert_eq!(ids.store_value(), "ami-0abc");
    }

    #[test]
    fn amazon_multi_region_is_stored_as_sorted_json() {
        let ids = ArtifactIdParser::AmazonEbs
            .parse("us-west-2:ami-2,eu-west-1:ami-1")
            .unwrap();
        assert_eq!(ids.pairs().len(), 2);
        assert_eq!(
            ids.store_value(),
            r#"{"eu-west-1":"ami-1","us-west-2":"ami-2"}"#
        );
    }

    #[test]
    fn amazon_rejects_broken_entry() {
        assert!(ArtifactIdParser::AmazonEbs
            .parse("us-east-1:ami-1,eu-west-1")
            .is_err());
    }

    #[test]
    fn lookup_by_builder_id() {
        assert_eq!(
            ArtifactIdParser::for_builder_id("pearkes.digitalocean"),
            Some(ArtifactIdParser::DigitalOcean)
        );
        assert_eq!(ArtifactIdParser::for_builder_id("mitchellh.docker"), None);
        assert_eq!(ArtifactIdParser::AmazonEbs.key_prefix(), "snaps/aws/");
    }
}
