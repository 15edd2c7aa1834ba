use crate::error::GateError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level relay configuration.
///
/// Built once at startup and passed by reference to each component;
/// nothing reads configuration through global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base path under which form routes and the healthcheck live.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// Append-log storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

/// Message template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,
}

/// Slack Web API settings. Token and channel are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel: String,
    /// Override for tests; points at https://slack.com/api in production.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// Fields displayed in the outgoing notification. All required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub logo_url: String,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_port() -> u16 { 1789 }
fn default_base_path() -> String { "/contact-notification".into() }
fn default_out_dir() -> PathBuf { "./out".into() }
fn default_templates_dir() -> PathBuf { "./templates".into() }
fn default_api_base() -> String { "https://slack.com/api".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            templates: TemplatesConfig::default(),
            slack: SlackConfig::default(),
            branding: BrandingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_path: default_base_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { out_dir: default_out_dir() }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { dir: default_templates_dir() }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            website_url: String::new(),
            logo_url: String::new(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from YAML file + env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: RelayConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("FORMGATE_").split("_"))
            .extract()?;
        Ok(config)
    }

    /// Reject configurations missing required options before the listener starts.
    pub fn validate(&self) -> Result<(), GateError> {
        let mut missing = Vec::new();
        if self.slack.token.is_empty() {
            missing.push("slack.token");
        }
        if self.slack.channel.is_empty() {
            missing.push("slack.channel");
        }
        if self.branding.company_name.is_empty() {
            missing.push("branding.company_name");
        }
        if self.branding.website_url.is_empty() {
            missing.push("branding.website_url");
        }
        if self.branding.logo_url.is_empty() {
            missing.push("branding.logo_url");
        }
        if !missing.is_empty() {
            return Err(GateError::Config(format!(
                "missing required options: {}",
                missing.join(", ")
            )));
        }
        if !self.server.base_path.starts_with('/') {
            return Err(GateError::Config(format!(
                "base_path must start with '/': {}",
                self.server.base_path
            )));
        }
        Ok(())
    }
}
