//! Key-value store subsystem
//!
//! Components:
//! - `kv_store`: the `KvStore` trait, the single write capability.
//! - `types`: client settings and their environment defaults.
//! - `consul`: reqwest-based Consul implementation.
//! - `memory`: in-process implementation for dry runs and tests.

pub mod consul;
pub mod kv_store;
pub mod memory;
pub mod types;

pub use consul::ConsulClient;
pub use kv_store::KvStore;
pub use memory::MemoryStore;
pub use types::{Scheme, StoreClientConfig};
