use thiserror::Error;

/// Default search results origin. Overridable via `EVENTBRITE_BASE_URL`
/// so staging and tests can point the pipeline at a local server.
pub const DEFAULT_BASE_URL: &str = "https://www.eventbrite.com";

/// Upper bound for `REQUEST_DELAY`, in seconds. Keeps the parsed value
/// safely convertible to a `Duration`.
pub const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Runtime configuration for the fetch-and-extract pipeline.
///
/// All fields have defaults; nothing is required in the environment.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Minimum delay between outbound requests, in seconds. Enforced
    /// globally by the rate governor.
    pub request_delay_secs: f64,
    /// Additional fetch attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Pick a pseudo-random user agent per request instead of a fixed one.
    pub user_agent_rotation: bool,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Result pages probed per fetch target before giving up on it.
    pub max_pages_per_target: usize,
    /// Origin the search and detail URLs are built against.
    pub base_url: String,
    /// Route fetches through a headless browser session so script-rendered
    /// content is present in the DOM before extraction.
    pub use_browser: bool,
}

/// Load pipeline configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var fails to parse.
pub fn load_config() -> Result<ScraperConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Load pipeline configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var fails to parse.
pub fn load_config_from_env() -> Result<ScraperConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_config<F>(lookup: F) -> Result<ScraperConfig, ConfigError>
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

    let request_delay_secs = {
        let raw = or_default("REQUEST_DELAY", "2");
        let value = raw
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "REQUEST_DELAY".to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_finite() || value < 0.0 || value > MAX_REQUEST_DELAY_SECS {
            return Err(ConfigError::InvalidEnvVar {
                var: "REQUEST_DELAY".to_string(),
                reason: format!(
                    "must be a number between 0 and {MAX_REQUEST_DELAY_SECS}, got {raw}"
                ),
            });
        }
        value
    };

    let max_retries = parse_u32("MAX_RETRIES", "3")?;
    let user_agent_rotation = parse_bool(&or_default("USER_AGENT_ROTATION", "true"))
        .ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "USER_AGENT_ROTATION".to_string(),
            reason: "expected a boolean (true/false/1/0/t/f)".to_string(),
        })?;
    let request_timeout_secs = parse_u64("REQUEST_TIMEOUT_SECS", "30")?;
    let max_pages_per_target = parse_usize("MAX_PAGES_PER_TARGET", "5")?;
    let base_url = or_default("EVENTBRITE_BASE_URL", DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let use_browser =
        parse_bool(&or_default("USE_BROWSER", "false")).ok_or_else(|| {
            ConfigError::InvalidEnvVar {
                var: "USE_BROWSER".to_string(),
                reason: "expected a boolean (true/false/1/0/t/f)".to_string(),
            }
        })?;

    Ok(ScraperConfig {
        request_delay_secs,
        max_retries,
        user_agent_rotation,
        request_timeout_secs,
        max_pages_per_target,
        base_url,
        use_browser,
    })
}

/// Parse the boolean spellings accepted in the environment.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" => Some(true),
        "false" | "0" | "f" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
