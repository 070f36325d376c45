use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use smartmenu_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let file = config_file_doc.as_ref();
    let path = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source("database.url", Some("SMARTMENU_DATABASE_URL"), file, path),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source(
            "database.max_connections",
            Some("SMARTMENU_DATABASE_MAX_CONNECTIONS"),
            file,
            path,
        ),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source("database.timeout_secs", Some("SMARTMENU_DATABASE_TIMEOUT_SECS"), file, path),
    ));

    lines.push(render_line(
        "voice.enabled",
        &config.voice.enabled.to_string(),
        field_source("voice.enabled", Some("SMARTMENU_VOICE_ENABLED"), file, path),
    ));
    let api_key = config
        .voice
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render_line(
        "voice.api_key",
        &api_key,
        field_source("voice.api_key", Some("SMARTMENU_VOICE_API_KEY"), file, path),
    ));
    lines.push(render_line(
        "voice.agent_id",
        config.voice.agent_id.as_deref().unwrap_or("(unset)"),
        field_source("voice.agent_id", Some("SMARTMENU_VOICE_AGENT_ID"), file, path),
    ));
    lines.push(render_line(
        "voice.base_url",
        &config.voice.base_url,
        field_source("voice.base_url", Some("SMARTMENU_VOICE_BASE_URL"), file, path),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source("server.bind_address", Some("SMARTMENU_SERVER_BIND_ADDRESS"), file, path),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source("server.port", Some("SMARTMENU_SERVER_PORT"), file, path),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        field_source(
            "server.health_check_port",
            Some("SMARTMENU_SERVER_HEALTH_CHECK_PORT"),
            file,
            path,
        ),
    ));
    lines.push(render_line(
        "server.order_poll_secs",
        &config.server.order_poll_secs.to_string(),
        field_source("server.order_poll_secs", Some("SMARTMENU_SERVER_ORDER_POLL_SECS"), file, path),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", Some("SMARTMENU_LOGGING_LEVEL"), file, path),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        field_source("logging.format", Some("SMARTMENU_LOGGING_FORMAT"), file, path),
    ));

    lines.join("\n")
}

fn render_line(field: &str, value: &str, source: String) -> String {
    format!("  {field} = {value}  [{source}]")
}

fn field_source(
    field: &str,
    env_var: Option<&str>,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if let Some(env_var) = env_var {
        if env::var(env_var).map(|value| !value.trim().is_empty()).unwrap_or(false) {
            return format!("env:{env_var}");
        }
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        if file_contains_field(doc, field) {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn file_contains_field(doc: &Value, dotted_field: &str) -> bool {
    let mut current = doc;
    for part in dotted_field.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("smartmenu.toml"), PathBuf::from("config/smartmenu.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn redact_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}***")
}
