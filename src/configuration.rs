//! Configuration decoding and validation.
//!
//! - `types`: raw, user-facing configuration fragments.
//! - `interpolate`: template rendering applied to every string field.
//! - `address`: Consul address normalization.
//! - `config`: merging and validation into a [`Config`].

pub mod address;
pub mod config;
pub mod interpolate;
pub mod types;

pub use config::{load_fragment, Config};
pub use interpolate::InterpolationContext;
pub use types::RawConfig;
