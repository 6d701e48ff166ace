//! Artifact post-processing.
//!
//! Re-exports:
//! - [`PostProcessor`]: origin check, identifier extraction, one store write.
//! - [`KeyFormat`] and [`derive_key`]: store key policy.

pub mod key;
pub mod post_processor;

pub use key::{derive_key, KeyFormat};
pub use post_processor::{PostProcessFailure, PostProcessResult, PostProcessor};
