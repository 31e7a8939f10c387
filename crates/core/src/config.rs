use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::{parse_timezone, DEFAULT_TIMEZONE};
use crate::error::ScheduleError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub calendar: CalendarConfig,
    pub telegram: TelegramConfig,
    pub poller: PollerConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SVITLO_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SVITLO_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            calendar: CalendarConfig::from_env_profiled(p),
            telegram: TelegramConfig::from_env_profiled(p),
            poller: PollerConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  calendar:  url={}, group={}, tz={}",
            self.calendar.api_url.as_deref().unwrap_or("(none)"),
            self.calendar.group,
            self.calendar.timezone
        );
        tracing::info!(
            "  telegram:  api={}, token={}, concurrency={}",
            self.telegram.api_url,
            if self.telegram.is_configured() { "set" } else { "(none)" },
            self.telegram.broadcast_concurrency
        );
        tracing::info!("  poller:    every {}s", self.poller.interval_secs);
        tracing::info!(
            "  storage:   backend={}, data_dir={}",
            self.storage.backend,
            self.storage.data_dir.display()
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "calendar": {
                "api_url": self.calendar.api_url,
                "group": self.calendar.group,
                "timezone": self.calendar.timezone,
                "configured": self.calendar.is_configured(),
            },
            "telegram": {
                "api_url": self.telegram.api_url,
                "configured": self.telegram.is_configured(),
            },
            "poller": { "interval_secs": self.poller.interval_secs },
            "storage": {
                "backend": self.storage.backend,
                "data_dir": self.storage.data_dir,
                "database_configured": self.storage.database_url.is_some(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 3000),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Calendar API ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub api_url: Option<String>,
    pub city_id: String,
    pub street_id: String,
    pub house_id: String,
    pub group: String,
    pub timezone: String,
    pub referer: String,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
}

impl CalendarConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_url: profiled_env_opt(p, "API_URL"),
            city_id: profiled_env_or(p, "CITY_ID", ""),
            street_id: profiled_env_or(p, "STREET_ID", ""),
            house_id: profiled_env_or(p, "HOUSE_ID", ""),
            group: profiled_env_or(p, "GROUP", ""),
            timezone: profiled_env_or(p, "TIMEZONE", DEFAULT_TIMEZONE),
            referer: profiled_env_or(p, "API_REFERER", "https://poweron.toe.com.ua/"),
            user_agent: profiled_env_or(p, "API_USER_AGENT", "Mozilla/5.0"),
            fetch_timeout_secs: profiled_env_parse(p, "FETCH_TIMEOUT_SECS", 20),
        }
    }

    /// Address-derived `time` query token.
    pub fn address_token(&self) -> String {
        format!("{}{}{}", self.city_id, self.street_id, self.house_id)
    }

    /// Plain text behind the `x-debug-key` header, before base64.
    pub fn debug_key_source(&self) -> String {
        format!("{}/{}/{}", self.city_id, self.street_id, self.house_id)
    }

    pub fn tz(&self) -> Result<Tz, ScheduleError> {
        parse_timezone(&self.timezone)
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && !self.group.is_empty()
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    pub api_url: String,
    pub send_timeout_secs: u64,
    pub broadcast_concurrency: usize,
    pub updates_timeout_secs: u64,
}

impl TelegramConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            bot_token: profiled_env_opt(p, "TELEGRAM_BOT_TOKEN"),
            api_url: profiled_env_or(p, "TELEGRAM_API_URL", "https://api.telegram.org"),
            send_timeout_secs: profiled_env_parse(p, "SEND_TIMEOUT_SECS", 10),
            broadcast_concurrency: profiled_env_parse(p, "BROADCAST_CONCURRENCY", 8usize).max(1),
            updates_timeout_secs: profiled_env_parse(p, "UPDATES_TIMEOUT_SECS", 30),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }
}

// ── Poller ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval_secs: u64,
}

impl PollerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_secs: profiled_env_parse(p, "POLL_INTERVAL_SECS", 900u64).max(1),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "file" | "json" => Ok(StoreBackend::File),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        let raw = profiled_env_or(p, "STORE_BACKEND", "file");
        let backend = raw.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to file store");
            StoreBackend::File
        });
        Self {
            backend,
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            database_url: profiled_env_opt(p, "DATABASE_URL"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 5),
        }
    }
}
