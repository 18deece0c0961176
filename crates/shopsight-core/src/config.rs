use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
///
/// Every knob has a default; the only external requirement is `OPENAI_API_KEY`,
/// and even that is optional — without it the pipeline runs heuristics-only.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("SHOPSIGHT_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("SHOPSIGHT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SHOPSIGHT_USER_AGENT", "shopsight/0.1 (brand-intelligence)");
    let max_retries = parse_u32("SHOPSIGHT_MAX_RETRIES", "3")?;
    let backoff_base_ms = parse_u64("SHOPSIGHT_RETRY_BACKOFF_BASE_MS", "500")?;

    let catalog_page_limit = parse_u32("SHOPSIGHT_CATALOG_PAGE_LIMIT", "250")?;
    let max_catalog_pages = parse_usize("SHOPSIGHT_MAX_CATALOG_PAGES", "50")?;

    let fetch_concurrency = parse_usize("SHOPSIGHT_FETCH_CONCURRENCY", "5")?;
    let llm_concurrency = parse_usize("SHOPSIGHT_LLM_CONCURRENCY", "2")?;
    let llm_max_retries = parse_u32("SHOPSIGHT_LLM_MAX_RETRIES", "2")?;
    let global_deadline_secs = parse_u64("SHOPSIGHT_GLOBAL_DEADLINE_SECS", "60")?;

    // Treat an empty key the same as an absent one.
    let openai_api_key = lookup("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let openai_model = or_default("SHOPSIGHT_OPENAI_MODEL", "gpt-4o-mini");

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        backoff_base_ms,
        catalog_page_limit,
        max_catalog_pages,
        fetch_concurrency,
        llm_concurrency,
        llm_max_retries,
        global_deadline_secs,
        openai_api_key,
        openai_model,
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
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.fetch_concurrency, 5);
        assert_eq!(cfg.llm_concurrency, 2);
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSIGHT_FETCH_CONCURRENCY", "9");
        map.insert("SHOPSIGHT_MAX_RETRIES", "0");
        map.insert("OPENAI_API_KEY", "sk-test");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.fetch_concurrency, 9);
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn build_app_config_rejects_non_numeric_timeout() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSIGHT_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPSIGHT_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(SHOPSIGHT_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_treats_blank_api_key_as_absent() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("OPENAI_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("OPENAI_API_KEY", "sk-very-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
