use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with the relay URL populated, which the default
/// `GETMEDS_USE_RELAY=true` requires.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("GETMEDS_RELAY_URL", "https://relay.example.workers.dev");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "GETMEDS_ENV"));
}

#[test]
fn build_app_config_requires_relay_url_when_relay_enabled() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::RelayUrlRequired)),
        "expected RelayUrlRequired, got: {result:?}"
    );
}

#[test]
fn relay_url_error_points_at_direct_mode() {
    let message = ConfigError::RelayUrlRequired.to_string();
    assert!(message.contains("GETMEDS_RELAY_URL"));
    assert!(message.contains("GETMEDS_USE_RELAY=false"));
}

#[test]
fn build_app_config_allows_missing_relay_url_when_relay_disabled() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("GETMEDS_USE_RELAY", "false");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.use_relay);
    assert!(cfg.relay_url.is_none());
}

#[test]
fn build_app_config_treats_blank_relay_url_as_missing() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("GETMEDS_RELAY_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::RelayUrlRequired)));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.retailers_path.to_string_lossy(),
        "./config/retailers.yaml"
    );
    assert_eq!(
        cfg.relay_url.as_deref(),
        Some("https://relay.example.workers.dev")
    );
    assert!(cfg.use_relay);
    assert_eq!(cfg.relay_bind_addr.to_string(), "0.0.0.0:8787");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "GetMeds/1.0");
    assert_eq!(cfg.min_query_length, 2);
    assert_eq!(cfg.sopharmacy_max_products, 5);
    assert_eq!(cfg.sopharmacy_enrich_limit, 3);
    assert_eq!(cfg.vmclub_max_products, 10);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("GETMEDS_RELAY_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GETMEDS_RELAY_BIND_ADDR"),
        "expected InvalidEnvVar(GETMEDS_RELAY_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_use_relay_flag() {
    let mut map = full_env();
    map.insert("GETMEDS_USE_RELAY", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GETMEDS_USE_RELAY"),
        "expected InvalidEnvVar(GETMEDS_USE_RELAY), got: {result:?}"
    );
}

#[test]
fn request_timeout_secs_override() {
    let mut map = full_env();
    map.insert("GETMEDS_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_secs_invalid() {
    let mut map = full_env();
    map.insert("GETMEDS_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GETMEDS_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(GETMEDS_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn user_agent_override() {
    let mut map = full_env();
    map.insert("GETMEDS_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}

#[test]
fn min_query_length_zero_is_rejected() {
    let mut map = full_env();
    map.insert("GETMEDS_MIN_QUERY_LENGTH", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GETMEDS_MIN_QUERY_LENGTH"),
        "expected InvalidEnvVar(GETMEDS_MIN_QUERY_LENGTH), got: {result:?}"
    );
}

#[test]
fn sopharmacy_bounds_override() {
    let mut map = full_env();
    map.insert("GETMEDS_SOPHARMACY_MAX_PRODUCTS", "3");
    map.insert("GETMEDS_SOPHARMACY_ENRICH_LIMIT", "1");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sopharmacy_max_products, 3);
    assert_eq!(cfg.sopharmacy_enrich_limit, 1);
}

#[test]
fn sopharmacy_max_products_invalid() {
    let mut map = full_env();
    map.insert("GETMEDS_SOPHARMACY_MAX_PRODUCTS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GETMEDS_SOPHARMACY_MAX_PRODUCTS"),
        "expected InvalidEnvVar(GETMEDS_SOPHARMACY_MAX_PRODUCTS), got: {result:?}"
    );
}

#[test]
fn parse_flag_accepts_common_spellings() {
    assert_eq!(parse_flag("TRUE"), Some(true));
    assert_eq!(parse_flag(" yes "), Some(true));
    assert_eq!(parse_flag("0"), Some(false));
    assert_eq!(parse_flag("off"), Some(false));
    assert_eq!(parse_flag(""), None);
}

#[test]
fn relay_server_config_does_not_need_relay_url() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("GETMEDS_USE_RELAY", "true");
    map.insert("GETMEDS_RELAY_BIND_ADDR", "127.0.0.1:9000");
    let cfg = build_relay_server_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.use_relay);
    assert_eq!(cfg.relay_bind_addr.to_string(), "127.0.0.1:9000");
}
