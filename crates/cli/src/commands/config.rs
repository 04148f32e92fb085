use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use webhook_relay_core::config::{env_keys, AppConfig, LoadOptions, CONFIG_FILE_NAME};

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 2,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, keys: &[&str]| {
        field_source(key_path, keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "discord.bot_token",
            &redact_token(config.discord.bot_token.expose_secret()),
            source("discord.bot_token", &[env_keys::BOT_TOKEN, env_keys::BOT_TOKEN_FALLBACK]),
        ),
        render_line(
            "discord.guild_id",
            &config.discord.guild_id.to_string(),
            source("discord.guild_id", &[env_keys::GUILD_ID]),
        ),
        render_line(
            "discord.query_channel_id",
            &config.discord.query_channel_id.to_string(),
            source("discord.query_channel_id", &[env_keys::QUERY_CHANNEL_ID]),
        ),
        render_line(
            "webhook.url",
            &config.webhook.url,
            source("webhook.url", &[env_keys::WEBHOOK_URL]),
        ),
        render_line(
            "webhook.header_name",
            config.webhook.header_name.as_deref().unwrap_or("<unset>"),
            source("webhook.header_name", &[env_keys::HEADER_NAME]),
        ),
    ];

    let header_value = if config.header_value().is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "webhook.header_value",
        header_value,
        source("webhook.header_value", &[env_keys::HEADER_VALUE]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &[env_keys::LOG_LEVEL]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &[env_keys::LOG_FORMAT]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys.iter().find(|key| {
        env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Bot tokens are `<id>.<timestamp>.<hmac>`; only the first segment is shown.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('.') {
        return format!("{prefix}.***");
    }

    "<redacted>".to_string()
}
