use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One configuration fragment as written by the user.
///
/// Every field is optional at this stage: fragments coming from a file, the
/// command line and the host are merged with [`RawConfig::merge`] before the
/// result is validated into a [`super::config::Config`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub consul_address: Option<String>,
    pub consul_scheme: Option<String>,
    pub consul_token: Option<String>,

    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub skip_tls_verify: Option<bool>,

    pub snapshot_name: Option<String>,
    pub snapshot_version: Option<String>,

    /// Builder whose artifacts are accepted, e.g. `pearkes.digitalocean`.
    pub builder_id: Option<String>,
    /// `path` (`name/version`) or `suffix` (`name-version`).
    pub key_format: Option<String>,

    /// User variables available to `{{user `name`}}`.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    pub packer_build_name: Option<String>,
    pub packer_builder_type: Option<String>,
}

impl RawConfig {
    /// Overlays `other` on top of `self`: set fields in `other` win.
    pub fn merge(mut self, other: RawConfig) -> RawConfig {
        fn overlay<T>(base: &mut Option<T>, top: Option<T>) {
            if top.is_some() {
                *base = top;
            }
        }

        overlay(&mut self.consul_address, other.consul_address);
        overlay(&mut self.consul_scheme, other.consul_scheme);
        overlay(&mut self.consul_token, other.consul_token);
        overlay(&mut self.ca_file, other.ca_file);
        overlay(&mut self.cert_file, other.cert_file);
        overlay(&mut self.key_file, other.key_file);
        overlay(&mut self.skip_tls_verify, other.skip_tls_verify);
        overlay(&mut self.snapshot_name, other.snapshot_name);
        overlay(&mut self.snapshot_version, other.snapshot_version);
        overlay(&mut self.builder_id, other.builder_id);
        overlay(&mut self.key_format, other.key_format);
        overlay(&mut self.packer_build_name, other.packer_build_name);
        overlay(&mut self.packer_builder_type, other.packer_builder_type);
        self.variables.extend(other.variables);
        self
    }

    /// Folds fragments left to right.
    pub fn merge_all<I>(fragments: I) -> RawConfig
    where
        I: IntoIterator<Item = RawConfig>,
    {
        fragments
            .into_iter()
            .fold(RawConfig::default(), RawConfig::merge)
    }
}

/// CA bundle, client certificate and client key used for mutual TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub ca_file: PathBuf,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// A string that must never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}
