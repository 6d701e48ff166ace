use std::fmt;
use std::str::FromStr;

/// How the snapshot version is joined to the snapshot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// `<prefix><name>/<version>`
    #[default]
    Path,
    /// `<prefix><name>-<version>`
    Suffix,
}

impl KeyFormat {
    fn separator(&self) -> char {
        match self {
            KeyFormat::Path => '/',
            KeyFormat::Suffix => '-',
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Path => f.write_str("path"),
            KeyFormat::Suffix => f.write_str("suffix"),
        }
    }
}

impl FromStr for KeyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(KeyFormat::Path),
            "suffix" => Ok(KeyFormat::Suffix),
            other => Err(other.to_string()),
        }
    }
}

/// Builds the store key for a snapshot.
pub fn derive_key(prefix: &str, name: &str, version: Option<&str>, format: KeyFormat) -> String {
    match version.filter(|v| !v.is_empty()) {
        Some(version) => format!("{}{}{}{}", prefix, name, format.separator(), version),
        None => format!("{}{}", prefix, name),
    }
}

/// True for `.` and `..`, including their percent-encoded spellings.
///
/// URL resolution collapses these segments, so a key containing one would be
/// written somewhere else than announced.
pub fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// First `/`-separated segment of `value` that is a dot segment.
pub fn find_dot_segment(value: &str) -> Option<&str> {
    value.split('/').find(|segment| is_dot_segment(segment))
}
