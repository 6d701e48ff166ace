//! Minimal template engine for configuration strings.
//!
//! Supported calls: `{{user `name`}}`, `{{env `NAME`}}`, `{{timestamp}}`,
//! `{{isotime}}`, `{{uuid}}`, `{{build_name}}` and `{{build_type}}`.
//! Arguments may be quoted with backticks or double quotes.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use uuid::Uuid;

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\{\{\s*(?P<func>[A-Za-z_][A-Za-z0-9_]*)(?:\s+(?:`(?P<bq>[^`]*)`|"(?P<dq>[^"]*)"))?\s*\}\}"#)
            .expect("template pattern is valid")
    })
}

/// Values available while rendering one configuration.
#[derive(Debug, Clone)]
pub struct InterpolationContext {
    user_variables: BTreeMap<String, String>,
    build_name: Option<String>,
    build_type: Option<String>,
    now: DateTime<Utc>,
}

impl Default for InterpolationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpolationContext {
    pub fn new() -> Self {
        Self {
            user_variables: BTreeMap::new(),
            build_name: None,
            build_type: None,
            now: Utc::now(),
        }
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.user_variables.extend(variables);
        self
    }

    pub fn with_build(mut self, name: Option<String>, builder_type: Option<String>) -> Self {
        self.build_name = name;
        self.build_type = builder_type;
        self
    }

    /// Pins the clock used by `timestamp` and `isotime`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Renders every template call found in `input`.
    pub fn render(&self, input: &str) -> Result<String, String> {
        if !input.contains("{{") {
            return Ok(input.to_string());
        }

        if call_pattern().replace_all(input, "").contains("{{") {
            return Err(format!("unterminated or malformed template in {:?}", input));
        }

        let mut failure: Option<String> = None;
        let rendered = call_pattern().replace_all(input, |caps: &Captures| {
            let arg = caps
                .name("bq")
                .or_else(|| caps.name("dq"))
                .map(|m| m.as_str());
            match self.call(&caps["func"], arg) {
                Ok(value) => value,
                Err(reason) => {
                    failure.get_or_insert(reason);
                    String::new()
                }
            }
        });

        match failure {
            Some(reason) => Err(reason),
            None => Ok(rendered.into_owned()),
        }
    }

    fn call(&self, func: &str, arg: Option<&str>) -> Result<String, String> {
        let required = |name: &str| {
            arg.map(str::to_string)
                .ok_or_else(|| format!("function \"{}\" expects one argument", name))
        };

        match func {
            "user" => {
                let name = required("user")?;
                self.user_variables
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("user variable \"{}\" is not defined", name))
            }
            // Unset environment variables render empty.
            "env" => Ok(std::env::var(required("env")?).unwrap_or_default()),
            "timestamp" => Ok(self.now.timestamp().to_string()),
            "isotime" => Ok(self.now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            "uuid" => Ok(Uuid::new_v4().to_string()),
            "build_name" => Ok(self.build_name.clone().unwrap_or_default()),
            "build_type" => Ok(self.build_type.clone().unwrap_or_default()),
            other => Err(format!("function \"{}\" not defined", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;

    fn ctx() -> InterpolationContext {
        let mut vars = BTreeMap::new();
        vars.insert("release".to_string(), "v7".to_string());
        InterpolationContext::new()
            .with_variables(vars)
            .with_build(Some("web-nyc3".into()), Some("digitalocean".into()))
            .at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn plain_strings_pass_through() {
        assert_eq!(ctx().render("web").unwrap(), "web");
    }

    #[test]
    fn user_variables_are_substituted() {
        assert_eq!(ctx().render("web-{{user `release`}}").unwrap(), "web-v7");
        assert_eq!(ctx().render("{{ user \"release\" }}").unwrap(), "v7");
    }

    #[test]
    fn undefined_user_variable_fails() {
        let err = ctx().render("{{user `missing`}}").unwrap_err();
        assert!(err.contains("missing"));
    }

    #[test]
    fn clock_functions_use_pinned_time() {
        assert_eq!(ctx().render("{{timestamp}}").unwrap(), "1714564800");
        assert_eq!(ctx().render("{{isotime}}").unwrap(), "2024-05-01T12:00:00Z");
    }

    #[test]
    fn build_functions() {
        assert_eq!(
            ctx().render("{{build_name}}/{{build_type}}").unwrap(),
            "web-nyc3/digitalocean"
        );
    }

    #[test]
    fn uuid_renders_a_fresh_id() {
        let rendered = ctx().render("{{uuid}}").unwrap();
        assert!(Uuid::parse_str(&rendered).is_ok());
    }

    #[test]
    #[serial]
    fn env_lookup() {
        std::env::set_var("KVSNAP_TEST_FLAVOR", "blue");
        assert_eq!(ctx().render("{{env `KVSNAP_TEST_FLAVOR`}}").unwrap(), "blue");
        std::env::remove_var("KVSNAP_TEST_FLAVOR");
        assert_eq!(ctx().render("{{env `KVSNAP_TEST_FLAVOR`}}").unwrap(), "");
    }

    #[test]
    fn unknown_function_fails() {
        assert!(ctx().render("{{nope}}").is_err());
        assert!(ctx().render("{{user}}").is_err());
    }

    #[test]
    fn malformed_template_fails() {
        assert!(ctx().render("{{user `release`").is_err());
        assert!(ctx().render("web-{{user `release`}}-{{").is_err());
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut vars = BTreeMap::new();
        vars.insert("raw".to_string(), "a{{b".to_string());
        let rendered = ctx().with_variables(vars).render("{{user `raw`}}").unwrap();
        assert_eq!(rendered, "a{{b");
    }
}
