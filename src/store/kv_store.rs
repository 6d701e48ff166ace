//! Key-value store trait
//!
//! This module defines the `KvStore` trait, the only capability the
//! post-processor needs from a remote store: a single unconditional write.
//!
//! Implementors of this trait are responsible for:
//! - Reaching the store with whatever transport they use
//! - Writing the value under the given key, replacing any previous value
//!
//! There is no read, no compare-and-set and no retry.

use crate::error_handling::types::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Writes `value` under `key`.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Short description of where writes go, for log lines.
    fn describe(&self) -> String;
}

