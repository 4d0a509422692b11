use common::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Session lifetime in days. Default: 30.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
    /// Name of the session cookie. Default: "mg_session".
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether the session cookie carries the `Secure` attribute. Default: true.
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
    /// User keys seeded into the credential allowlist at startup.
    #[serde(default)]
    pub allowed_keys: Vec<String>,
}

fn default_session_ttl_days() -> i64 {
    30
}
fn default_cookie_name() -> String {
    "mg_session".into()
}
fn default_secure_cookie() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            cookie_name: default_cookie_name(),
            secure_cookie: default_secure_cookie(),
            allowed_keys: Vec::new(),
        }
    }
}

/// Settings for the external generation provider.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_video_model")]
    pub video_model: String,
    /// Per-request HTTP timeout. Default: 120 seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upstream_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".into()
}
fn default_video_model() -> String {
    "veo-3.0-generate-001".into()
}
fn default_upstream_timeout_secs() -> u64 {
    120
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_key: String::new(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    /// Lifetime of a pending video operation handle. Default: 24 hours.
    #[serde(default = "default_operation_ttl_hours")]
    pub operation_ttl_hours: i64,
}

fn default_operation_ttl_hours() -> i64 {
    24
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            operation_ttl_hours: default_operation_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://mediagate.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MEDIAGATE__UPSTREAM__API_KEY)
            .add_source(
                Environment::with_prefix("MEDIAGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_keys")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
