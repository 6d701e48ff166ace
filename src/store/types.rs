use crate::configuration::address::{DEFAULT_CONSUL_API_PORT, DEFAULT_CONSUL_HOST};
use crate::configuration::types::{Secret, TlsFiles};
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";
pub const ENV_HTTP_SSL: &str = "CONSUL_HTTP_SSL";
pub const ENV_HTTP_SSL_VERIFY: &str = "CONSUL_HTTP_SSL_VERIFY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(other.to_string()),
        }
    }
}

/// Everything needed to build a store client.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreClientConfig {
    /// `host:port` of the agent.
    pub address: String,
    pub scheme: Scheme,
    pub token: Option<Secret>,
    pub tls: Option<TlsFiles>,
    pub skip_tls_verify: bool,
}

impl Default for StoreClientConfig {
    fn default() -> Self {
        Self {
            address: format!("{}:{}", DEFAULT_CONSUL_HOST, DEFAULT_CONSUL_API_PORT),
            scheme: Scheme::Http,
            token: None,
            tls: None,
            skip_tls_verify: false,
        }
    }
}

impl StoreClientConfig {
    /// Client defaults, adjusted by the standard `CONSUL_HTTP_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_HTTP_ADDR).filter(|v| !v.is_empty()) {
            debug!("Using {} from environment: {}", ENV_HTTP_ADDR, addr);
            if let Some(rest) = addr.strip_prefix("https://") {
                config.scheme = Scheme::Https;
                config.address = rest.trim_end_matches('/').to_string();
            } else {
                config.address = addr
                    .strip_prefix("http://")
                    .unwrap_or(&addr)
                    .trim_end_matches('/')
                    .to_string();
            }
        }

        if let Some(token) = lookup(ENV_HTTP_TOKEN).filter(|v| !v.is_empty()) {
            config.token = Some(Secret::new(token));
        }

        if let Some(raw) = lookup(ENV_HTTP_SSL).filter(|v| !v.is_empty()) {
            match parse_bool(&raw) {
                Some(true) => config.scheme = Scheme::Https,
                Some(false) => {}
                None => warn!("Ignoring {}={:?}: not a boolean", ENV_HTTP_SSL, raw),
            }
        }

        if let Some(raw) = lookup(ENV_HTTP_SSL_VERIFY).filter(|v| !v.is_empty()) {
            match parse_bool(&raw) {
                Some(verify) => config.skip_tls_verify = !verify,
                None => warn!("Ignoring {}={:?}: not a boolean", ENV_HTTP_SSL_VERIFY, raw),
            }
        }

        config
    }

    /// Base URL of the agent, e.g. `https://10.0.0.4:8501`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.address)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Some(true),
        "0" | "f" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_local_agent() {
        let config = StoreClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.address, "127.0.0.1:8500");
        assert_eq!(config.scheme, Scheme::Http);
        assert_eq!(config.base_url(), "http://127.0.0.1:8500");
    }

    #[test]
    fn https_address_switches_scheme() {
        let config =
            StoreClientConfig::from_lookup(lookup(&[(ENV_HTTP_ADDR, "https://consul:8501/")]));
        assert_eq!(config.address, "consul:8501");
        assert_eq!(config.scheme, Scheme::Https);
    }

    #[test]
    fn ssl_flags() {
        let config = StoreClientConfig::from_lookup(lookup(&[
            (ENV_HTTP_SSL, "true"),
            (ENV_HTTP_SSL_VERIFY, "false"),
            (ENV_HTTP_TOKEN, "abc"),
        ]));
        assert_eq!(config.scheme, Scheme::Https);
        assert!(config.skip_tls_verify);
        assert_eq!(config.token.as_ref().map(Secret::expose), Some("abc"));
    }

    #[test]
    fn garbage_booleans_are_ignored() {
        let config = StoreClientConfig::from_lookup(lookup(&[(ENV_HTTP_SSL, "maybe")]));
        assert_eq!(config.scheme, Scheme::Http);
    }

    #[test]
    #[serial]
    fn reads_process_environment() {
        std::env::set_var(ENV_HTTP_ADDR, "consul.service:8500");
        let config = StoreClientConfig::from_env();
        std::env::remove_var(ENV_HTTP_ADDR);
        assert_eq!(config.address, "consul.service:8500");
    }

    #[test]
    fn scheme_parsing() {
        assert_eq!("https".parse::<Scheme>(), Ok(Scheme::Https));
        assert_eq!("ftp".parse::<Scheme>(), Err("ftp".to_string()));
    }
}
