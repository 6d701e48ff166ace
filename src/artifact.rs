//! Build artifacts handed over by the host.
//!
//! - `types`: the [`Artifact`] trait and the concrete [`BuildArtifact`].
//! - `id_parser`: builder-specific grammars for artifact IDs.
//! - `manifest`: reader for Packer build manifests.

pub mod id_parser;
pub mod manifest;
pub mod types;

pub use id_parser::{ArtifactIdParser, SnapshotIds};
pub use manifest::PackerManifest;
pub use types::{Artifact, BuildArtifact};
