use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadcall_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<(&str, String, Option<&str>)> = vec![
        ("llm.base_url", config.llm.base_url.clone(), Some("LEADCALL_LLM_BASE_URL")),
        ("llm.model", config.llm.model.clone(), Some("LEADCALL_LLM_MODEL")),
        ("llm.temperature", config.llm.temperature.to_string(), Some("LEADCALL_LLM_TEMPERATURE")),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), Some("LEADCALL_LLM_TIMEOUT_SECS")),
        (
            "llm.api_key",
            redact_secret(config.llm.api_key.is_some()),
            Some("LEADCALL_LLM_API_KEY"),
        ),
        ("search.endpoint", config.search.endpoint.clone(), Some("LEADCALL_SEARCH_ENDPOINT")),
        (
            "search.timeout_secs",
            config.search.timeout_secs.to_string(),
            Some("LEADCALL_SEARCH_TIMEOUT_SECS"),
        ),
        (
            "search.api_key",
            redact_secret(config.search.api_key.is_some()),
            Some("LEADCALL_SEARCH_API_KEY"),
        ),
        ("call.language", config.call.language.clone(), Some("LEADCALL_CALL_LANGUAGE")),
        ("call.price_floor", config.call.price_floor.clone(), Some("LEADCALL_CALL_PRICE_FLOOR")),
        ("logging.level", config.logging.level.clone(), Some("LEADCALL_LOGGING_LEVEL")),
        ("logging.format", format!("{:?}", config.logging.format), Some("LEADCALL_LOGGING_FORMAT")),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in fields {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("leadcall.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/leadcall.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(present: bool) -> String {
    if present { "<redacted>".to_string() } else { "<unset>".to_string() }
}
