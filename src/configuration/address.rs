//! Normalization of the Consul agent address.
//!
//! Users write the address as a URL (`https://consul.internal:8501/`), a bare
//! host (`consul.internal`) or a `host:port` pair. The HTTP client only wants
//! `host:port`, so everything else is dropped and the missing parts are filled
//! with the agent defaults.

use crate::error_handling::types::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_CONSUL_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONSUL_API_PORT: u16 = 8500;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://)?(?:[^@/?#]*@)?(?P<host>\[[0-9A-Fa-f:.]*\]|[^:/?#\[\]]*)(?::(?P<port>[^/?#]*))?(?:[/?#].*)?$",
        )
        .expect("address pattern is valid")
    })
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._\-]*$").expect("hostname pattern is valid"))
}

/// Parses `address` into a `host:port` string.
///
/// An empty host becomes [`DEFAULT_CONSUL_HOST`] and an empty port
/// [`DEFAULT_CONSUL_API_PORT`], so `""` yields `127.0.0.1:8500`.
pub fn parse_address(address: &str) -> Result<String, ConfigError> {
    let trimmed = address.trim();
    let invalid = |reason: &str| ConfigError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let captures = address_pattern()
        .captures(trimmed)
        .ok_or_else(|| invalid("not a URL or host:port pair"))?;

    let host = captures.name("host").map(|m| m.as_str()).unwrap_or_default();
    if !host.starts_with('[') && !hostname_pattern().is_match(host) {
        return Err(invalid("invalid host"));
    }
    let host = if host.is_empty() || host == "[]" {
        DEFAULT_CONSUL_HOST
    } else {
        host
    };

    let port = match captures.name("port").map(|m| m.as_str()) {
        None | Some("") => DEFAULT_CONSUL_API_PORT,
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| invalid(&format!("invalid port {:?}", raw)))?,
    };

    Ok(format!("{}:{}", host, port))
}
