//! Configuration for the Tag Manager server
//!
//! Resolution order, later wins:
//! defaults, JSON config file, dotenv-style env file, process environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "https://tagmanager.googleapis.com/tagmanager/v2";

/// Upper bound for `itemsPerPage` on list actions
pub const ITEMS_PER_PAGE: usize = 20;

/// Default config file location
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("GTM_MCP_CONFIG") {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("gtm-mcp")
        .join("config.json")
}

/// Default env file location (`ENV_FILE`, relative to the working directory)
pub fn env_file_path() -> PathBuf {
    let name = std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".to_string());
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tag Manager API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Pre-issued OAuth access token. When unset, tokens come from gcloud.
    #[serde(default)]
    pub access_token: Option<String>,

    /// gcloud executable used to mint application-default tokens
    #[serde(default = "default_gcloud_command")]
    pub gcloud_command: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_items_per_page")]
    pub max_items_per_page: usize,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_gcloud_command() -> String {
    "gcloud".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_items_per_page() -> usize {
    ITEMS_PER_PAGE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: None,
            gcloud_command: default_gcloud_command(),
            request_timeout_secs: default_request_timeout(),
            max_items_per_page: default_max_items_per_page(),
        }
    }
}

impl Config {
    /// Load from the default locations and the process environment
    pub fn load() -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&config_path(), &env_file_path(), &env)
    }

    /// Load with explicit sources. Missing files are skipped.
    pub fn load_from(
        config_file: &Path,
        env_file: &Path,
        process_env: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = if config_file.exists() {
            let content = fs::read_to_string(config_file)
                .with_context(|| format!("Failed to read config from {}", config_file.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config at {}", config_file.display()))?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_file.display());
            Config::default()
        };

        let mut vars = match fs::read_to_string(env_file) {
            Ok(content) => {
                let vars = parse_env_file(&content);
                tracing::debug!("Loaded {} variables from {}", vars.len(), env_file.display());
                vars
            }
            Err(_) => {
                tracing::debug!(
                    "No env file found at {}, using environment variables directly",
                    env_file.display()
                );
                HashMap::new()
            }
        };
        vars.extend(process_env.iter().map(|(k, v)| (k.clone(), v.clone())));

        config.apply_env(&vars)?;
        Ok(config)
    }

    fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(url) = get("GTM_API_BASE_URL") {
            self.api_base_url = url.to_string();
        }
        if let Some(token) = get("GTM_ACCESS_TOKEN") {
            self.access_token = Some(token.to_string());
        }
        if let Some(cmd) = get("GTM_GCLOUD_COMMAND") {
            self.gcloud_command = cmd.to_string();
        }
        if let Some(timeout) = get("GTM_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid GTM_REQUEST_TIMEOUT_SECS: {}", timeout))?;
        }
        Ok(())
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped,
/// `export ` prefixes and surrounding quotes are stripped.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            vars.insert(key.to_string(), value.to_string());
        }
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(
            &dir.path().join("missing.json"),
            &dir.path().join(".env"),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_items_per_page, 20);
    }

    #[test]
    fn test_layering() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("config.json");
        fs::write(
            &config_file,
            r#"{"api_base_url": "http://file", "request_timeout_secs": 5}"#,
        )
        .unwrap();
        let env_file = dir.path().join(".env");
        fs::write(
            &env_file,
            "# comment\nGTM_API_BASE_URL=\"http://envfile\"\nexport GTM_ACCESS_TOKEN='from-file'\n",
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("GTM_ACCESS_TOKEN".to_string(), "from-process".to_string());

        let config = Config::load_from(&config_file, &env_file, &env).unwrap();
        assert_eq!(config.api_base_url, "http://envfile");
        assert_eq!(config.access_token.as_deref(), Some("from-process"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.gcloud_command, "gcloud");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("config.json");
        fs::write(&config_file, "{not json").unwrap();
        let result = Config::load_from(&config_file, &dir.path().join(".env"), &HashMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_timeout_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut env = HashMap::new();
        env.insert("GTM_REQUEST_TIMEOUT_SECS".to_string(), "soon".to_string());
        let result = Config::load_from(&dir.path().join("c.json"), &dir.path().join(".env"), &env);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_env_file() {
        let vars = parse_env_file("A=1\n\n  B = two words \n=skip\nnoequals\nC='x'\n");
        assert_eq!(vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(vars.get("B").map(String::as_str), Some("two words"));
        assert_eq!(vars.get("C").map(String::as_str), Some("x"));
        assert_eq!(vars.len(), 3);
    }
}
