use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_TARGET_SUBS: &str =
    "Futurology+worldnews+technology+MachineLearning+artificial";
pub(crate) const DEFAULT_KEYWORDS: &str = "ai+artificial intelligence+machine learning+ml+deep learning+gpt+openai+chatgpt+llm+neural network";
pub(crate) const DEFAULT_EXCLUSION_TERMS: &str = "ukrain+russia+war+politics";
pub(crate) const DEFAULT_NEWSAPI_QUERY: &str = "\"AI\" OR \"artificial intelligence\" OR \"ChatGPT\" OR \"OpenAI\" \
     OR \"machine learning\" OR \"GPT\" OR \"automation\" OR \"deep learning\" \
     OR \"neural network\" OR \"LLM\" OR \"generative AI\"";
pub(crate) const DEFAULT_GNEWS_TOPICS: &str = "AI+artificial intelligence+machine learning+deep learning+ChatGPT+OpenAI+neural network+automation+LLM+generative AI+autonomous systems";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset for optional credentials.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
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

    let parse_list = |var: &str, default: &str| -> Result<Vec<String>, ConfigError> {
        let items = split_plus_list(&or_default(var, default));
        if items.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "list must contain at least one entry".to_string(),
            });
        }
        Ok(items)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("AINEWS_ENV", "development"));
    let log_level = or_default("AINEWS_LOG_LEVEL", "info");

    let reddit_client_id = optional("REDDIT_CLIENT_ID");
    let reddit_client_secret = optional("REDDIT_CLIENT_SECRET");
    let reddit_user_agent = optional("REDDIT_USER_AGENT");
    let newsapi_key = optional("NEWSAPI_KEY");

    let target_subreddits = parse_list("AINEWS_TARGET_SUBS", DEFAULT_TARGET_SUBS)?;
    let keywords = parse_list("AINEWS_KEYWORDS", DEFAULT_KEYWORDS)?;
    // Exclusions may legitimately be empty.
    let exclusion_terms = split_plus_list(&or_default(
        "AINEWS_EXCLUSION_TERMS",
        DEFAULT_EXCLUSION_TERMS,
    ));
    let newsapi_query = or_default("AINEWS_NEWSAPI_QUERY", DEFAULT_NEWSAPI_QUERY);
    let gnews_topics = parse_list("AINEWS_GNEWS_TOPICS", DEFAULT_GNEWS_TOPICS)?;
    let gnews_max_results = parse_usize("AINEWS_GNEWS_MAX_RESULTS", "10")?;

    let db_max_connections = parse_u32("AINEWS_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("AINEWS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AINEWS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_request_timeout_secs = parse_u64("AINEWS_HTTP_REQUEST_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("AINEWS_HTTP_USER_AGENT", "ainews/0.1 (ai-news-ingest)");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
        newsapi_key,
        target_subreddits,
        keywords,
        exclusion_terms,
        newsapi_query,
        gnews_topics,
        gnews_max_results,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_request_timeout_secs,
        http_user_agent,
    })
}

/// Split a `+`-separated env value, trimming entries and dropping empties.
fn split_plus_list(raw: &str) -> Vec<String> {
    raw.split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
