//! Configuration file management for tripweaver.
//!
//! Provides a TOML-based config file at `~/.config/tripweaver/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use tripweaver_core::auth::{JWT_SECRET_ENV, JwtConfig, REFRESH_SECRET_ENV};
use tripweaver_core::llm::OpenAiConfig;
use tripweaver_core::llm::openai::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, MODEL_ENV,
};
use tripweaver_db::config::{DATABASE_URL_ENV, DbConfig};

pub const BIND_ENV: &str = "TRIPWEAVER_BIND";
pub const PORT_ENV: &str = "TRIPWEAVER_PORT";
pub const API_PASSWORD_ENV: &str = "API_PASSWORD";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded secret for access tokens (64 hex chars = 32 bytes).
    pub jwt_secret: String,
    /// Hex-encoded secret for refresh tokens.
    pub refresh_secret: String,
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("jwt_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct LlmSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub api_password: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the tripweaver config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/tripweaver` or
/// `~/.config/tripweaver`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tripweaver");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tripweaver")
}

/// Return the path to the tripweaver config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Generate a random signing secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// DB URL: `cli_db_url` > `DATABASE_URL` > `[database] url` > default.
pub fn resolve_db_config(cli_db_url: Option<&str>, file: Option<&ConfigFile>) -> DbConfig {
    let url = cli_db_url
        .map(str::to_string)
        .or_else(|| env_var(DATABASE_URL_ENV))
        .or_else(|| file.map(|f| f.database.url.clone()))
        .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_string());
    DbConfig::new(url)
}

/// Signing secrets: `JWT_SECRET` / `REFRESH_SECRET` > `[auth]`. No default.
pub fn resolve_jwt_config(file: Option<&ConfigFile>) -> Result<JwtConfig> {
    let access = env_var(JWT_SECRET_ENV).or_else(|| file.map(|f| f.auth.jwt_secret.clone()));
    let refresh =
        env_var(REFRESH_SECRET_ENV).or_else(|| file.map(|f| f.auth.refresh_secret.clone()));

    match (access, refresh) {
        (Some(access), Some(refresh)) => {
            if access == refresh {
                tracing::warn!("access and refresh tokens share one signing secret");
            }
            Ok(JwtConfig::new(access, refresh))
        }
        (None, _) => bail!(
            "JWT secret not found; set {JWT_SECRET_ENV} or run `tripweaver init` to create a config file"
        ),
        (_, None) => bail!(
            "refresh secret not found; set {REFRESH_SECRET_ENV} or run `tripweaver init` to create a config file"
        ),
    }
}

/// Completion endpoint: env vars > `[llm]` > defaults. The API key is required.
pub fn resolve_llm_config(file: Option<&ConfigFile>) -> Result<OpenAiConfig> {
    let llm = file.map(|f| &f.llm);
    let Some(api_key) = env_var(API_KEY_ENV).or_else(|| llm.and_then(|l| l.api_key.clone()))
    else {
        bail!(
            "OpenAI API key not found; set {API_KEY_ENV} or add `api_key` under [llm] in the config file"
        );
    };
    let base_url = env_var(BASE_URL_ENV)
        .or_else(|| llm.and_then(|l| l.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model = env_var(MODEL_ENV)
        .or_else(|| llm.and_then(|l| l.model.clone()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(OpenAiConfig::new(api_key)
        .with_base_url(base_url)
        .with_model(model))
}

/// Listener and legacy-route settings for `tripweaver serve`.
#[derive(Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    /// Enables `POST /generate_trip` when set.
    pub api_password: Option<String>,
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field(
                "api_password",
                &self.api_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

pub fn resolve_server_settings(
    cli_bind: Option<&str>,
    cli_port: Option<u16>,
    file: Option<&ConfigFile>,
) -> Result<ServerSettings> {
    let server = file.map(|f| &f.server);

    let bind = cli_bind
        .map(str::to_string)
        .or_else(|| env_var(BIND_ENV))
        .or_else(|| server.and_then(|s| s.bind.clone()))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let port = match cli_port {
        Some(port) => port,
        None => match env_var(PORT_ENV) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {raw}"))?,
            None => server.and_then(|s| s.port).unwrap_or(DEFAULT_PORT),
        },
    };

    let api_password =
        env_var(API_PASSWORD_ENV).or_else(|| server.and_then(|s| s.api_password.clone()));

    Ok(ServerSettings {
        bind,
        port,
        api_password,
    })
}

/// Everything `tripweaver serve` needs.
#[derive(Debug)]
pub struct TripweaverConfig {
    pub db_config: DbConfig,
    pub jwt_config: JwtConfig,
    pub llm_config: OpenAiConfig,
    pub server: ServerSettings,
}

impl TripweaverConfig {
    pub fn resolve(
        cli_db_url: Option<&str>,
        cli_bind: Option<&str>,
        cli_port: Option<u16>,
    ) -> Result<Self> {
        let file = load_config().ok();
        let file = file.as_ref();
        Ok(Self {
            db_config: resolve_db_config(cli_db_url, file),
            jwt_config: resolve_jwt_config(file)?,
            llm_config: resolve_llm_config(file)?,
            server: resolve_server_settings(cli_bind, cli_port, file)?,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
