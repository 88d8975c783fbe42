//! Application configuration for CourseCraft.
//!
//! User config lives at `~/.coursecraft/coursecraft.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseCraftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursecraft.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursecraft";

// ---------------------------------------------------------------------------
// Config structs (matching coursecraft.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Completion endpoint settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Search endpoint settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Logo and titles stamped on rendered documents.
    #[serde(default)]
    pub branding: BrandingConfig,

    /// Keyword list for the search relevance filter.
    #[serde(default)]
    pub relevance: RelevanceConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Domain used when a command does not pass one.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Directory exported packages are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_domain() -> String {
    "pharmaceutical and medical".into()
}
fn default_output_dir() -> String {
    ".".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model for free-text and CSV generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model for slide outlines.
    #[serde(default = "default_slides_model")]
    pub slides_model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            base_url: default_openai_base_url(),
            model: default_model(),
            slides_model: default_slides_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_slides_model() -> String {
    "gpt-4".into()
}
fn default_timeout_secs() -> u64 {
    120
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Env var holding the custom search engine id (`cx`).
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,

    /// Search endpoint URL.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            engine_id_env: default_engine_id_env(),
            base_url: default_search_base_url(),
        }
    }
}

fn default_search_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_engine_id_env() -> String {
    "CUSTOM_SEARCH_ENGINE_ID".into()
}
fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}

/// `[branding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    /// Optional JPEG logo placed on PDF and Word documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,

    /// Heading line of PDF/Word documents and package title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Subtitle on the title slide of generated decks.
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            logo_path: None,
            title: default_title(),
            subtitle: default_subtitle(),
        }
    }
}

fn default_title() -> String {
    "Research Content Response".into()
}
fn default_subtitle() -> String {
    "A Comprehensive Overview in the Medical and Pharmaceutical Domain".into()
}

/// `[relevance]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Keywords a search hit must mention. Empty means the built-in
    /// research keyword list.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl BrandingConfig {
    /// Read the configured logo, if any.
    pub fn load_logo(&self) -> Result<Option<Vec<u8>>> {
        match &self.logo_path {
            Some(path) => {
                let path = Path::new(path);
                let bytes = std::fs::read(path).map_err(|e| CourseCraftError::io(path, e))?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursecraft/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseCraftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.coursecraft/coursecraft.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseCraftError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseCraftError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseCraftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseCraftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseCraftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a non-empty environment variable or fail with a config error naming it.
fn require_env(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(CourseCraftError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Return the completion API key from the env var named in config.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    require_env(&config.openai.api_key_env, "OpenAI API key")
}

/// Return `(api_key, engine_id)` for the search endpoint.
pub fn validate_search_keys(config: &AppConfig) -> Result<(String, String)> {
    let key = require_env(&config.search.api_key_env, "search API key")?;
    let cx = require_env(&config.search.engine_id_env, "search engine id")?;
    Ok((key, cx))
}
