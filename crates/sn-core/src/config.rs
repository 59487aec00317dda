use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

pub fn required_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing env: {name}"))
}

pub fn socket_addr_from_env(name: &str, default: &str) -> Result<SocketAddr> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    SocketAddr::from_str(&value).map_err(|err| anyhow!("invalid socket addr for {name}: {err}"))
}

/// Reads a positive integer, falling back to `default` when unset.
/// A set but unparsable value is an error rather than a silent default.
pub fn u64_from_env(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value
                .trim()
                .parse::<u64>()
                .map_err(|err| anyhow!("invalid integer for {name}: {err}"))?;
            if parsed == 0 {
                return Err(anyhow!("{name} must be greater than zero"));
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}

pub fn string_from_env(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
