//! Environment variable helpers shared by every crate's `from_env`.

use std::str::FromStr;

/// A configuration variable was set to a value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{var} has invalid value '{value}': expected {expected}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Read `var`, falling back to `default` when unset.
pub fn var_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Parse `var` as `T`, falling back to `default` when unset or empty.
pub fn parse_or<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(var, &raw, expected),
        _ => Ok(default),
    }
}

/// Read a boolean flag. Accepts `true`/`false`/`1`/`0` (case-insensitive).
pub fn flag(var: &'static str) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => parse_flag(var, &raw),
        _ => Ok(false),
    }
}

fn parse_value<T: FromStr>(
    var: &'static str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError {
        var,
        value: raw.to_string(),
        expected,
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError {
            var,
            value: raw.to_string(),
            expected: "true or false",
        }),
    }
}
