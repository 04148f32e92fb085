use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "webhook-relay.toml";

/// Environment keys read by [`AppConfig::load`].
pub mod env_keys {
    pub const BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
    pub const BOT_TOKEN_FALLBACK: &str = "DISCORD_TOKEN";
    pub const GUILD_ID: &str = "DISCORD_GUILD_ID";
    pub const QUERY_CHANNEL_ID: &str = "DISCORD_QUERY_CHANNEL_ID";
    pub const WEBHOOK_URL: &str = "MAKE_WEBHOOK_URL";
    pub const HEADER_NAME: &str = "MAKE_HEADER_NAME";
    pub const HEADER_VALUE: &str = "MAKE_HEADER_VALUE";
    pub const LOG_LEVEL: &str = "RELAY_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "RELAY_LOG_FORMAT";

    pub const ALL: &[&str] = &[
        BOT_TOKEN,
        BOT_TOKEN_FALLBACK,
        GUILD_ID,
        QUERY_CHANNEL_ID,
        WEBHOOK_URL,
        HEADER_NAME,
        HEADER_VALUE,
        LOG_LEVEL,
        LOG_FORMAT,
    ];
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub webhook: WebhookConfig,
    pub logging: LoggingConfig,
}

/// Discord ids are snowflakes and never zero, so `0` marks an unset id.
#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    pub guild_id: u64,
    pub query_channel_id: u64,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: String,
    pub header_name: Option<String>,
    pub header_value: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Which entry point is loading configuration. Each mode validates only the
/// settings it actually needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Relay,
    Ping,
    WebhookProbe,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bot_token: Option<String>,
    pub guild_id: Option<u64>,
    pub query_channel_id: Option<u64>,
    pub webhook_url: Option<String>,
    pub header_name: Option<String>,
    pub header_value: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub mode: RunMode,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("`{key}` must be a valid integer, got `{value}`")]
    InvalidInteger { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                bot_token: String::new().into(),
                guild_id: 0,
                query_channel_id: 0,
            },
            webhook: WebhookConfig { url: String::new(), header_name: None, header_value: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate(options.mode)?;

        Ok(config)
    }

    /// Header value with the secret exposed, for building the outbound request.
    pub fn header_value(&self) -> Option<&str> {
        self.webhook.header_value.as_ref().map(|value| value.expose_secret())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(bot_token) = discord.bot_token {
                self.discord.bot_token = bot_token.into();
            }
            if let Some(guild_id) = discord.guild_id {
                self.discord.guild_id = guild_id;
            }
            if let Some(query_channel_id) = discord.query_channel_id {
                self.discord.query_channel_id = query_channel_id;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(url) = webhook.url {
                self.webhook.url = url;
            }
            if let Some(header_name) = webhook.header_name {
                self.webhook.header_name = Some(header_name);
            }
            if let Some(header_value) = webhook.header_value {
                self.webhook.header_value = Some(header_value.into());
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let bot_token =
            read_env(env_keys::BOT_TOKEN).or_else(|| read_env(env_keys::BOT_TOKEN_FALLBACK));
        if let Some(value) = bot_token {
            self.discord.bot_token = value.into();
        }
        if let Some(value) = read_env(env_keys::GUILD_ID) {
            self.discord.guild_id = parse_id(env_keys::GUILD_ID, &value)?;
        }
        if let Some(value) = read_env(env_keys::QUERY_CHANNEL_ID) {
            self.discord.query_channel_id = parse_id(env_keys::QUERY_CHANNEL_ID, &value)?;
        }

        if let Some(value) = read_env(env_keys::WEBHOOK_URL) {
            self.webhook.url = value;
        }
        if let Some(value) = read_env(env_keys::HEADER_NAME) {
            self.webhook.header_name = Some(value);
        }
        if let Some(value) = read_env(env_keys::HEADER_VALUE) {
            self.webhook.header_value = Some(value.into());
        }

        if let Some(value) = read_env(env_keys::LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = read_env(env_keys::LOG_FORMAT) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.bot_token {
            self.discord.bot_token = bot_token.into();
        }
        if let Some(guild_id) = overrides.guild_id {
            self.discord.guild_id = guild_id;
        }
        if let Some(query_channel_id) = overrides.query_channel_id {
            self.discord.query_channel_id = query_channel_id;
        }
        if let Some(webhook_url) = overrides.webhook_url {
            self.webhook.url = webhook_url;
        }
        if let Some(header_name) = overrides.header_name {
            self.webhook.header_name = Some(header_name);
        }
        if let Some(header_value) = overrides.header_value {
            self.webhook.header_value = Some(header_value.into());
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self, mode: RunMode) -> Result<(), ConfigError> {
        match mode {
            RunMode::Relay => {
                validate_token(&self.discord)?;
                validate_ids(&self.discord)?;
                validate_webhook(&self.webhook)?;
            }
            RunMode::Ping => validate_token(&self.discord)?,
            RunMode::WebhookProbe => validate_webhook(&self.webhook)?,
        }
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_token(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "discord.bot_token is required. Set {} (or {}) in the environment or .env file",
            env_keys::BOT_TOKEN,
            env_keys::BOT_TOKEN_FALLBACK
        )));
    }

    Ok(())
}

fn validate_ids(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.guild_id == 0 {
        return Err(ConfigError::Validation(format!(
            "discord.guild_id is required and must be a non-zero integer ({})",
            env_keys::GUILD_ID
        )));
    }

    if discord.query_channel_id == 0 {
        return Err(ConfigError::Validation(format!(
            "discord.query_channel_id is required and must be a non-zero integer ({})",
            env_keys::QUERY_CHANNEL_ID
        )));
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    let url = webhook.url.trim();
    if url.is_empty() {
        return Err(ConfigError::Validation(format!(
            "webhook.url is required ({})",
            env_keys::WEBHOOK_URL
        )));
    }

    let parsed = Url::parse(url).map_err(|error| {
        ConfigError::Validation(format!("webhook.url is not a valid URL: {error}"))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(
            "webhook.url must start with http:// or https://".to_string(),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::Validation("webhook.url must include a host".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_id(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    webhook: Option<WebhookPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
    guild_id: Option<u64>,
    query_channel_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    url: Option<String>,
    header_name: Option<String>,
    header_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        env_keys, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, RunMode,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_relay_env() {
        env::set_var(env_keys::BOT_TOKEN, "bot-token-from-env");
        env::set_var(env_keys::GUILD_ID, "123456789012345678");
        env::set_var(env_keys::QUERY_CHANNEL_ID, "223456789012345678");
        env::set_var(env_keys::WEBHOOK_URL, "https://hook.example.com/abc");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn env_only_load_succeeds_for_relay_mode() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        set_relay_env();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.discord.guild_id == 123_456_789_012_345_678, "guild id should parse")?;
            ensure(
                config.discord.query_channel_id == 223_456_789_012_345_678,
                "channel id should parse",
            )?;
            ensure(config.webhook.url == "https://hook.example.com/abc", "url should load")?;
            ensure(config.webhook.header_name.is_none(), "header name should default to none")?;
            ensure(config.header_value().is_none(), "header value should default to none")?;
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn fallback_token_variable_is_used_when_primary_is_absent() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        env::set_var(env_keys::BOT_TOKEN_FALLBACK, "fallback-token");

        let result = (|| -> Result<(), String> {
            let config =
                AppConfig::load(LoadOptions { mode: RunMode::Ping, ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.discord.bot_token.expose_secret() == "fallback-token",
                "DISCORD_TOKEN should be used when DISCORD_BOT_TOKEN is unset",
            )
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn primary_token_variable_wins_over_fallback() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        env::set_var(env_keys::BOT_TOKEN, "primary-token");
        env::set_var(env_keys::BOT_TOKEN_FALLBACK, "fallback-token");

        let result = (|| -> Result<(), String> {
            let config =
                AppConfig::load(LoadOptions { mode: RunMode::Ping, ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.discord.bot_token.expose_secret() == "primary-token",
                "DISCORD_BOT_TOKEN should win",
            )
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn each_missing_required_value_fails_relay_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let cases = [
            (env_keys::BOT_TOKEN, "discord.bot_token"),
            (env_keys::GUILD_ID, "discord.guild_id"),
            (env_keys::QUERY_CHANNEL_ID, "discord.query_channel_id"),
            (env_keys::WEBHOOK_URL, "webhook.url"),
        ];

        let result = (|| -> Result<(), String> {
            for (missing, expected) in cases {
                clear_vars(env_keys::ALL);
                set_relay_env();
                env::remove_var(missing);

                match AppConfig::load(LoadOptions::default()) {
                    Ok(_) => return Err(format!("expected failure when `{missing}` is unset")),
                    Err(ConfigError::Validation(message)) if message.contains(expected) => {}
                    Err(other) => {
                        return Err(format!("unexpected error for `{missing}`: {other}"));
                    }
                }
            }
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn non_integer_ids_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = (|| -> Result<(), String> {
            for key in [env_keys::GUILD_ID, env_keys::QUERY_CHANNEL_ID] {
                clear_vars(env_keys::ALL);
                set_relay_env();
                env::set_var(key, "not-a-number");

                let error = match AppConfig::load(LoadOptions::default()) {
                    Ok(_) => return Err(format!("expected `{key}` parse failure")),
                    Err(error) => error,
                };
                ensure(
                    matches!(error, ConfigError::InvalidInteger { key: ref k, .. } if k == key),
                    "error should name the malformed id variable",
                )?;
            }
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn whitespace_only_values_count_as_missing() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        set_relay_env();
        env::set_var(env_keys::WEBHOOK_URL, "   ");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("blank webhook url should fail validation".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref m) if m.contains("webhook.url")),
                "validation failure should mention webhook.url",
            )
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn webhook_url_without_host_is_rejected_at_load() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        set_relay_env();

        let result = (|| -> Result<(), String> {
            for url in ["https://", "http://", "ftp://hook.example.com/abc", "not a url"] {
                env::set_var(env_keys::WEBHOOK_URL, url);
                let loaded = AppConfig::load(LoadOptions::default());
                let message = loaded.err().map(|error| error.to_string()).unwrap_or_default();
                ensure(message.contains("webhook.url"), "malformed webhook url should be fatal")?;
            }

            env::set_var(env_keys::WEBHOOK_URL, "https://hook.eu1.make.com:8443/abc?x=1");
            ensure(
                AppConfig::load(LoadOptions::default()).is_ok(),
                "url with port and query should load",
            )
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn webhook_url_requires_http_scheme() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        set_relay_env();
        env::set_var(env_keys::WEBHOOK_URL, "hook.example.com/abc");

        let result = (|| -> Result<(), String> {
            let loaded = AppConfig::load(LoadOptions::default());
            ensure(loaded.is_err(), "scheme-less webhook url should be rejected")
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn ping_mode_only_requires_token() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);

        let result = (|| -> Result<(), String> {
            let missing = AppConfig::load(LoadOptions { mode: RunMode::Ping, ..Default::default() });
            ensure(missing.is_err(), "ping mode should still require a token")?;

            AppConfig::load(LoadOptions {
                mode: RunMode::Ping,
                overrides: ConfigOverrides {
                    bot_token: Some("ping-token".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("ping config should load: {err}"))?;
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn webhook_probe_mode_only_requires_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        env::set_var(env_keys::WEBHOOK_URL, "http://127.0.0.1:9/hook");

        let result = (|| -> Result<(), String> {
            AppConfig::load(LoadOptions { mode: RunMode::WebhookProbe, ..Default::default() })
                .map_err(|err| format!("probe config should load: {err}"))?;
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        env::set_var("TEST_RELAY_BOT_TOKEN", "token-from-interpolation");
        env::set_var("TEST_RELAY_HEADER_VALUE", "Bearer interpolated");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("webhook-relay.toml");
            fs::write(
                &path,
                r#"
[discord]
bot_token = "${TEST_RELAY_BOT_TOKEN}"
guild_id = 42
query_channel_id = 43

[webhook]
url = "https://hook.example.com/from-file"
header_name = "X-Make-Apikey"
header_value = "${TEST_RELAY_HEADER_VALUE}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.discord.bot_token.expose_secret() == "token-from-interpolation",
                "bot token should be interpolated from environment",
            )?;
            ensure(config.discord.guild_id == 42, "guild id should load from file")?;
            ensure(
                config.webhook.header_name.as_deref() == Some("X-Make-Apikey"),
                "header name should load from file",
            )?;
            ensure(
                config.header_value() == Some("Bearer interpolated"),
                "header value should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_RELAY_BOT_TOKEN", "TEST_RELAY_HEADER_VALUE"]);
        result
    }

    #[test]
    fn unterminated_interpolation_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("webhook-relay.toml");
        fs::write(&path, "[discord]\nbot_token = \"${UNCLOSED\"\n").map_err(|e| e.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..Default::default() }) {
                Ok(_) => return Err("unterminated interpolation should fail".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::UnterminatedInterpolation),
            "error should be UnterminatedInterpolation",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let loaded = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(loaded, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        env::set_var(env_keys::WEBHOOK_URL, "https://hook.example.com/from-env");
        env::set_var(env_keys::LOG_FORMAT, "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("webhook-relay.toml");
            fs::write(
                &path,
                r#"
[discord]
bot_token = "token-from-file"
guild_id = 1
query_channel_id = 2

[webhook]
url = "https://hook.example.com/from-file"

[logging]
level = "warn"
format = "pretty"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    guild_id: Some(99),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.discord.guild_id == 99, "override guild id should win")?;
            ensure(config.discord.query_channel_id == 2, "file channel id should survive")?;
            ensure(
                config.webhook.url == "https://hook.example.com/from-env",
                "env webhook url should win over file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "env log format should win over file",
            )?;
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(env_keys::ALL);
        set_relay_env();
        env::set_var(env_keys::BOT_TOKEN, "super-secret-bot-token");
        env::set_var(env_keys::HEADER_VALUE, "super-secret-header");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-bot-token"), "debug should hide bot token")?;
            ensure(!debug.contains("super-secret-header"), "debug should hide header value")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(env_keys::ALL);
        result
    }
}
