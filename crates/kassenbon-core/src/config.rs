use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric variable is set to a non-numeric value.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Load configuration from environment variables already in the process.
///
/// Unlike [`load_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric variable is set to a non-numeric value.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// This is the parsing/validation core, decoupled from the real environment
/// so it can be tested with a pure `HashMap` lookup.
fn build_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    Ok(AppConfig {
        receipts_path: PathBuf::from(or_default("KASSENBON_RECEIPTS_PATH", "lidl_receipts.json")),
        cookies_path: PathBuf::from(or_default("KASSENBON_COOKIES_PATH", "lidl_cookies.json")),
        base_url: or_default("KASSENBON_BASE_URL", "https://www.lidl.de"),
        country: or_default("KASSENBON_COUNTRY", "DE"),
        language: or_default("KASSENBON_LANGUAGE", "de-DE"),
        log_level: or_default("KASSENBON_LOG_LEVEL", "info"),
        request_timeout_secs: parse_u64("KASSENBON_REQUEST_TIMEOUT_SECS", "15")?,
        request_delay_ms: parse_u64("KASSENBON_REQUEST_DELAY_MS", "500")?,
        pages_to_check: parse_u32("KASSENBON_PAGES_TO_CHECK", "3")?,
        max_retries: parse_u32("KASSENBON_MAX_RETRIES", "3")?,
        retry_backoff_base_secs: parse_u64("KASSENBON_RETRY_BACKOFF_BASE_SECS", "5")?,
        user_agent: or_default(
            "KASSENBON_USER_AGENT",
            "kassenbon/0.1 (personal receipt archive)",
        ),
    })
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn empty_env_yields_all_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_config(lookup_from_map(&map)).expect("defaults should load");
        assert_eq!(cfg.receipts_path, PathBuf::from("lidl_receipts.json"));
        assert_eq!(cfg.cookies_path, PathBuf::from("lidl_cookies.json"));
        assert_eq!(cfg.base_url, "https://www.lidl.de");
        assert_eq!(cfg.country, "DE");
        assert_eq!(cfg.language, "de-DE");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.request_delay_ms, 500);
        assert_eq!(cfg.pages_to_check, 3);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_backoff_base_secs, 5);
        assert_eq!(cfg.user_agent, "kassenbon/0.1 (personal receipt archive)");
    }

    #[test]
    fn overrides_are_honored() {
        let mut map = HashMap::new();
        map.insert("KASSENBON_RECEIPTS_PATH", "/data/receipts.json");
        map.insert("KASSENBON_COUNTRY", "AT");
        map.insert("KASSENBON_REQUEST_DELAY_MS", "1000");
        let cfg = build_config(lookup_from_map(&map)).expect("overrides should load");
        assert_eq!(cfg.receipts_path, PathBuf::from("/data/receipts.json"));
        assert_eq!(cfg.country, "AT");
        assert_eq!(cfg.request_delay_ms, 1000);
    }

    #[test]
    fn invalid_numeric_value_is_a_typed_error() {
        let mut map = HashMap::new();
        map.insert("KASSENBON_PAGES_TO_CHECK", "many");
        let result = build_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KASSENBON_PAGES_TO_CHECK"),
            "expected InvalidEnvVar(KASSENBON_PAGES_TO_CHECK), got: {result:?}"
        );
    }

    #[test]
    fn invalid_timeout_is_a_typed_error() {
        let mut map = HashMap::new();
        map.insert("KASSENBON_REQUEST_TIMEOUT_SECS", "-1");
        let result = build_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KASSENBON_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(KASSENBON_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }
}
