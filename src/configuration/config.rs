use super::address::parse_address;
use super::interpolate::InterpolationContext;
use super::types::{RawConfig, Secret, TlsFiles};
use crate::artifact::id_parser::{ArtifactIdParser, DIGITALOCEAN_BUILDER_ID};
use crate::error_handling::types::{ConfigError, ConfigErrors};
use crate::processor::key::{derive_key, find_dot_segment, KeyFormat};
use crate::store::types::{Scheme, StoreClientConfig};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Validated post-processor configuration.
///
/// Built once per run by [`Config::from_raws`] and read-only afterwards.
///
/// # Fields Overview
///
/// - `consul_address`: normalized `host:port` of the Consul agent; `None` keeps
///   the client default (`127.0.0.1:8500` or `CONSUL_HTTP_ADDR`)
/// - `consul_scheme`: `http` or `https`; `None` keeps the client default
/// - `consul_token`: ACL token sent with the write
/// - `tls`: CA bundle, client certificate and key; all three or nothing
/// - `skip_tls_verify`: accept any server certificate
/// - `snapshot_name`: required, used to build the key
/// - `snapshot_version`: optional, joined to the name according to `key_format`
/// - `artifact_parser`: accepted builder and its artifact ID grammar
/// - `key_format`: how the version is joined to the name
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub consul_address: Option<String>,
    pub consul_scheme: Option<Scheme>,
    pub consul_token: Option<Secret>,
    pub tls: Option<TlsFiles>,
    pub skip_tls_verify: bool,
    pub snapshot_name: String,
    pub snapshot_version: Option<String>,
    pub artifact_parser: ArtifactIdParser,
    pub key_format: KeyFormat,
}

impl Config {
    /// Merges `raws` in order, renders templates and validates the result.
    ///
    /// Every problem is collected before returning, so a single run reports
    /// all misconfigurations at once.
    pub fn from_raws(
        raws: Vec<RawConfig>,
        context: &InterpolationContext,
    ) -> Result<Config, ConfigErrors> {
        info!("Configuring post-processor from {} fragment(s)", raws.len());
        let merged = RawConfig::merge_all(raws);
        let context = context
            .clone()
            .with_variables(merged.variables.clone())
            .with_build(
                merged.packer_build_name.clone(),
                merged.packer_builder_type.clone(),
            );

        let mut errs = ConfigErrors::new();
        let mut render = |field: &str, value: Option<String>| -> Option<String> {
            let value = value?;
            match context.render(&value) {
                Ok(rendered) if rendered.is_empty() => None,
                Ok(rendered) => Some(rendered),
                Err(reason) => {
                    errs.push(ConfigError::Template {
                        field: field.to_string(),
                        reason,
                    });
                    None
                }
            }
        };

        let consul_address = render("consul_address", merged.consul_address);
        let consul_scheme = render("consul_scheme", merged.consul_scheme);
        let consul_token = render("consul_token", merged.consul_token);
        let ca_file = render("ca_file", merged.ca_file);
        let cert_file = render("cert_file", merged.cert_file);
        let key_file = render("key_file", merged.key_file);
        let snapshot_name = render("snapshot_name", merged.snapshot_name);
        let snapshot_version = render("snapshot_version", merged.snapshot_version);
        let builder_id = render("builder_id", merged.builder_id);
        let key_format = render("key_format", merged.key_format);

        let consul_address = consul_address.and_then(|address| match parse_address(&address) {
            Ok(normalized) => Some(normalized),
            Err(e) => {
                errs.push(e);
                None
            }
        });

        let consul_scheme = consul_scheme.and_then(|scheme| match scheme.parse::<Scheme>() {
            Ok(parsed) => Some(parsed),
            Err(bad) => {
                errs.push(ConfigError::InvalidScheme(bad));
                None
            }
        });

        // Required fields, then the TLS group: all three or none.
        let mut required: Vec<(&str, bool)> = vec![("snapshot_name", snapshot_name.is_some())];
        if ca_file.is_some() || cert_file.is_some() || key_file.is_some() {
            required.push(("ca_file", ca_file.is_some()));
            required.push(("cert_file", cert_file.is_some()));
            required.push(("key_file", key_file.is_some()));
        }
        debug!(
            "Fields to check: {:?}",
            required.iter().map(|(name, _)| *name).collect::<Vec<_>>()
        );
        for (field, present) in &required {
            if !present {
                let e = ConfigError::MissingField(field.to_string());
                error!("Error: {}", e);
                errs.push(e);
            }
        }

        for (field, value) in [
            ("snapshot_name", &snapshot_name),
            ("snapshot_version", &snapshot_version),
        ] {
            if let Some(value) = value {
                if find_dot_segment(value).is_some() {
                    let e = ConfigError::DotSegment {
                        field: field.to_string(),
                        value: value.clone(),
                    };
                    error!("Error: {}", e);
                    errs.push(e);
                }
            }
        }

        let tls = match (ca_file, cert_file, key_file) {
            (Some(ca), Some(cert), Some(key)) => Some(TlsFiles {
                ca_file: PathBuf::from(ca),
                cert_file: PathBuf::from(cert),
                key_file: PathBuf::from(key),
            }),
            _ => None,
        };

        let builder_id = builder_id.unwrap_or_else(|| DIGITALOCEAN_BUILDER_ID.to_string());
        let artifact_parser = match ArtifactIdParser::for_builder_id(&builder_id) {
            Some(parser) => parser,
            None => {
                errs.push(ConfigError::UnsupportedBuilder(builder_id));
                ArtifactIdParser::DigitalOcean
            }
        };

        let key_format = match key_format.map(|f| f.parse::<KeyFormat>()) {
            None => KeyFormat::default(),
            Some(Ok(format)) => format,
            Some(Err(bad)) => {
                errs.push(ConfigError::InvalidKeyFormat(bad));
                KeyFormat::default()
            }
        };

        let config = Config {
            consul_address,
            consul_scheme,
            consul_token: consul_token.map(Secret::new),
            tls,
            skip_tls_verify: merged.skip_tls_verify.unwrap_or(false),
            snapshot_name: snapshot_name.unwrap_or_default(),
            snapshot_version,
            artifact_parser,
            key_format,
        };

        match errs.into_result(config) {
            Ok(config) => {
                info!(
                    "Configuration valid: snapshots of {} go to {}",
                    config.artifact_parser.builder_id(),
                    config.store_key()
                );
                Ok(config)
            }
            Err(errs) => {
                error!("Configuration rejected with {} error(s)", errs.len());
                Err(errs)
            }
        }
    }

    /// Key under which the snapshot identifier is written.
    pub fn store_key(&self) -> String {
        derive_key(
            self.artifact_parser.key_prefix(),
            &self.snapshot_name,
            self.snapshot_version.as_deref(),
            self.key_format,
        )
    }

    /// Client settings: environment defaults overlaid with this configuration.
    pub fn store_client_config(&self) -> StoreClientConfig {
        self.overlay_client_config(StoreClientConfig::from_env())
    }

    /// Overlays the explicit settings of this configuration on `base`.
    pub fn overlay_client_config(&self, mut base: StoreClientConfig) -> StoreClientConfig {
        if let Some(address) = &self.consul_address {
            base.address = address.clone();
        }
        if let Some(scheme) = self.consul_scheme {
            base.scheme = scheme;
        }
        if let Some(token) = &self.consul_token {
            base.token = Some(token.clone());
        }
        if let Some(tls) = &self.tls {
            if self.consul_scheme == Some(Scheme::Http) {
                warn!("TLS files are configured, using https instead of the configured http scheme");
            }
            base.scheme = Scheme::Https;
            base.tls = Some(tls.clone());
        }
        base.skip_tls_verify = base.skip_tls_verify || self.skip_tls_verify;
        base
    }
}

/// Reads one configuration fragment from a TOML or JSON file.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_fragment(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::Json(e.to_string()))?
    } else {
        toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
    };
    info!("Loaded configuration fragment from {}", path.display());
    Ok(raw)
}
