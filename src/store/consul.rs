//! Consul KV client
//!
//! HTTP client for the `/v1/kv` endpoint of a Consul agent. Only the write path
//! is implemented.

use crate::configuration::types::Secret;
use crate::error_handling::types::StoreError;
use crate::processor::key::find_dot_segment;
use crate::store::kv_store::KvStore;
use crate::store::types::StoreClientConfig;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Certificate, Client, Identity, Url};
use std::fs;
use std::path::Path;

pub const TOKEN_HEADER: &str = "X-Consul-Token";

pub struct ConsulClient {
    client: Client,
    base_url: Url,
    token: Option<Secret>,
}

impl ConsulClient {
    /// Builds a client from `config`, loading TLS material when configured.
    pub fn new(config: &StoreClientConfig) -> Result<Self, StoreError> {
        debug!("Creating consul client with config: {:?}", config);

        let base_url = Url::parse(&format!("{}/", config.base_url()))
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", config.base_url(), e)))?;

        // The agent is addressed directly, never through HTTP_PROXY.
        let mut builder = Client::builder().use_rustls_tls().no_proxy();

        if let Some(tls) = &config.tls {
            let ca = read_pem(&tls.ca_file)?;
            let certificate =
                Certificate::from_pem(&ca).map_err(|e| StoreError::Tls(e.to_string()))?;

            let mut identity_pem = read_pem(&tls.cert_file)?;
            identity_pem.push(b'\n');
            identity_pem.extend(read_pem(&tls.key_file)?);
            let identity =
                Identity::from_pem(&identity_pem).map_err(|e| StoreError::Tls(e.to_string()))?;

            builder = builder.add_root_certificate(certificate).identity(identity);
        }

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;
        info!("Consul client ready for {}", base_url);

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// URL of `key` under `/v1/kv/`, one path segment per `/`-separated part.
    pub fn key_url(&self, key: &str) -> Result<Url, StoreError> {
        if let Some(segment) = find_dot_segment(key) {
            return Err(StoreError::InvalidUrl(format!(
                "key {} contains the segment {:?}",
                key, segment
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(key.split('/'));
        Ok(url)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, StoreError> {
    fs::read(path).map_err(|source| StoreError::TlsMaterial {
        path: path.display().to_string(),
        source,
    })
}

#[async_trait]
impl KvStore for ConsulClient {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let url = self.key_url(key)?;
        debug!("PUT {} ({} byte(s))", url, value.len());

        let mut request = self.client.put(url).body(value.to_vec());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token.expose());
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to Consul failed: {}", e);
            StoreError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!("Consul answered {} for key {}", status, key);
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        if body.trim() == "false" {
            return Err(StoreError::Rejected(key.to_string()));
        }

        info!("Key {} written to Consul", key);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Consul at {}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::TlsFiles;
    use crate::store::types::Scheme;
    use std::path::PathBuf;

    fn client(address: &str) -> ConsulClient {
        ConsulClient::new(&StoreClientConfig {
            address: address.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn key_url_is_namespaced_and_encoded() {
        let consul = client("127.0.0.1:8500");
        assert_eq!(
            consul.key_url("snaps/do/web/v2").unwrap().as_str(),
            "http://127.0.0.1:8500/v1/kv/snaps/do/web/v2"
        );
        assert_eq!(
            consul.key_url("snaps/do/my app").unwrap().as_str(),
            "http://127.0.0.1:8500/v1/kv/snaps/do/my%20app"
        );
    }

    #[test]
    fn key_url_refuses_dot_segments() {
        let consul = client("127.0.0.1:8500");
        for key in ["snaps/do/web/..", "snaps/do/../web", "snaps/do/./web/v2", "snaps/%2e%2e/web"] {
            assert!(
                matches!(consul.key_url(key), Err(StoreError::InvalidUrl(_))),
                "{key} was accepted"
            );
        }
    }

    #[test]
    fn https_scheme_is_used() {
        let consul = ConsulClient::new(&StoreClientConfig {
            address: "consul.internal:8501".into(),
            scheme: Scheme::Https,
            skip_tls_verify: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(consul.describe(), "Consul at https://consul.internal:8501/");
    }

    #[test]
    fn missing_tls_material_is_a_client_error() {
        let config = StoreClientConfig {
            scheme: Scheme::Https,
            tls: Some(TlsFiles {
                ca_file: PathBuf::from("/nonexistent/ca.pem"),
                cert_file: PathBuf::from("/nonexistent/cert.pem"),
                key_file: PathBuf::from("/nonexistent/key.pem"),
            }),
            ..Default::default()
        };
        match ConsulClient::new(&config) {
            Err(StoreError::TlsMaterial { path, .. }) => assert!(path.ends_with("ca.pem")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("client built without TLS material"),
        }
    }

    #[test]
    fn garbage_tls_material_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str| {
            let path = dir.path().join(name);
            fs::write(&path, "not a pem").unwrap();
            path
        };
        let config = StoreClientConfig {
            scheme: Scheme::Https,
            tls: Some(TlsFiles {
                ca_file: write("ca.pem"),
                cert_file: write("cert.pem"),
                key_file: write("key.pem"),
            }),
            ..Default::default()
        };
        assert!(ConsulClient::new(&config).is_err());
    }

    #[test]
    fn unparseable_address_is_rejected() {
        let config = StoreClientConfig {
            address: "bad host:99999".into(),
            ..Default::default()
        };
        assert!(matches!(
            ConsulClient::new(&config),
            Err(StoreError::InvalidUrl(_))
        ));
    }
}
