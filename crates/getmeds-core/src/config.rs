use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or the relay is enabled without
/// a relay URL.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or the relay is enabled without
/// a relay URL.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load configuration for the relay server process.
///
/// The relay never forwards through another relay, so `GETMEDS_USE_RELAY`
/// is forced off and `GETMEDS_RELAY_URL` is not required.
///
/// # Errors
///
/// Returns `ConfigError` if any remaining value is invalid.
pub fn load_relay_server_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_relay_server_config(|key| std::env::var(key))
}

fn build_relay_server_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    build_app_config(|key| {
        if key == "GETMEDS_USE_RELAY" {
            Ok("false".to_string())
        } else {
            lookup(key)
        }
    })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no".to_string(),
            )
        })
    };

    let env = parse_environment(&or_default("GETMEDS_ENV", "development"))?;
    let log_level = or_default("GETMEDS_LOG_LEVEL", "info");
    let retailers_path = PathBuf::from(or_default(
        "GETMEDS_RETAILERS_PATH",
        "./config/retailers.yaml",
    ));

    let relay_url = lookup("GETMEDS_RELAY_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let use_relay = parse_bool("GETMEDS_USE_RELAY", "true")?;
    if use_relay && relay_url.is_none() {
        return Err(ConfigError::RelayUrlRequired);
    }

    let relay_bind_addr = parse_addr("GETMEDS_RELAY_BIND_ADDR", "0.0.0.0:8787")?;
    let request_timeout_secs = parse_u64("GETMEDS_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("GETMEDS_USER_AGENT", "GetMeds/1.0");

    let min_query_length = parse_usize("GETMEDS_MIN_QUERY_LENGTH", "2")?;
    if min_query_length == 0 {
        return Err(invalid(
            "GETMEDS_MIN_QUERY_LENGTH",
            "must be at least 1".to_string(),
        ));
    }

    let sopharmacy_max_products = parse_usize("GETMEDS_SOPHARMACY_MAX_PRODUCTS", "5")?;
    let sopharmacy_enrich_limit = parse_usize("GETMEDS_SOPHARMACY_ENRICH_LIMIT", "3")?;
    let vmclub_max_products = parse_usize("GETMEDS_VMCLUB_MAX_PRODUCTS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        retailers_path,
        relay_url,
        use_relay,
        relay_bind_addr,
        request_timeout_secs,
        user_agent,
        min_query_length,
        sopharmacy_max_products,
        sopharmacy_enrich_limit,
        vmclub_max_products,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GETMEDS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
