/// `load_config` module: builds the process-wide [`Settings`] once at startup.
///
/// Secrets come from the environment (a `.env` file is loaded by `main`):
/// - `NOTION_TOKEN`, `NOTION_DB_ID` (required)
/// - `SLACK_WEBHOOK_URL` (optional; unset or empty disables notifications)
/// - `GH_PAT` (optional; raises the GitHub API rate limit)
///
/// Non-secret tuning lives in an optional YAML file named by `GRADWATCH_CONFIG`.
/// Every key is optional and falls back to the built-in default:
///
/// ```yaml
/// repo: SimplifyJobs/New-Grad-Positions
/// readme_path: README.md
/// sections:
///   - "## 💻 Software Engineering New Grad Roles"
/// ledger_path: seen.json
/// region_label: NYC
/// region_patterns: ['\bNYC\b', '\bBrooklyn\b']
/// columns: { company: 0, title: 1, location: 2, link: 3, age: 4 }
/// ```
///
/// # Errors
/// Missing required variables, an unreadable or invalid YAML file and invalid
/// region patterns are reported as `anyhow::Error` and abort startup.
use anyhow::{anyhow, Context, Result};
use gradwatch_core::config::HarvestConfig;
use gradwatch_core::location::RegionMatcher;
use gradwatch_core::table::ColumnLayout;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::github::{DEFAULT_README_PATH, DEFAULT_REPO, GITHUB_API_URL};
use crate::notion::NOTION_API_URL;

pub const CONFIG_PATH_VAR: &str = "GRADWATCH_CONFIG";

/// Credentials and location of the Notion database records are tracked in.
#[derive(Clone)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub api_url: String,
}

impl fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionSettings")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Where the listings README is read from.
#[derive(Clone)]
pub struct GithubSettings {
    pub repo: String,
    pub readme_path: String,
    pub token: Option<String>,
    pub api_url: String,
}

impl fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSettings")
            .field("repo", &self.repo)
            .field("readme_path", &self.readme_path)
            .field("token_set", &self.token.is_some())
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub notion: NotionSettings,
    pub github: GithubSettings,
    pub slack_webhook_url: Option<String>,
    pub harvest: HarvestConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StaticConfig {
    repo: Option<String>,
    readme_path: Option<String>,
    github_api_url: Option<String>,
    notion_api_url: Option<String>,
    sections: Option<Vec<String>>,
    ledger_path: Option<PathBuf>,
    region_label: Option<String>,
    region_patterns: Option<Vec<String>>,
    columns: Option<ColumnLayout>,
}

/// Load settings from the environment and the optional file named by `GRADWATCH_CONFIG`.
pub fn load_config() -> Result<Settings> {
    let path = std::env::var_os(CONFIG_PATH_VAR)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    load_config_from(path.as_deref())
}

/// Load settings from the environment and, when given, the static YAML file at `path`.
pub fn load_config_from(path: Option<&Path>) -> Result<Settings> {
    let static_conf = match path {
        Some(path) => read_static_config(path)?,
        None => {
            info!("No static config file given, using defaults");
            StaticConfig::default()
        }
    };

    let notion_token = required_env("NOTION_TOKEN")?;
    let database_id = required_env("NOTION_DB_ID")?;
    let slack_webhook_url = optional_env("SLACK_WEBHOOK_URL");
    let github_token = optional_env("GH_PAT");
    info!(
        notification_enabled = slack_webhook_url.is_some(),
        github_token_set = github_token.is_some(),
        "Secrets read from environment"
    );

    let mut harvest = HarvestConfig::default();
    if let Some(sections) = static_conf.sections {
        harvest.sections = sections;
    }
    if let Some(columns) = static_conf.columns {
        harvest.columns = columns;
    }
    if let Some(ledger_path) = static_conf.ledger_path {
        harvest.ledger_path = ledger_path;
    }
    if let Some(label) = static_conf.region_label {
        harvest.region_label = label;
    }
    if let Some(patterns) = static_conf.region_patterns {
        harvest.region = RegionMatcher::new(&patterns).map_err(|e| {
            error!(error = %e, "Invalid region pattern in config");
            anyhow!("Invalid region pattern: {e}")
        })?;
    }

    let settings = Settings {
        notion: NotionSettings {
            token: notion_token,
            database_id,
            api_url: static_conf
                .notion_api_url
                .unwrap_or_else(|| NOTION_API_URL.to_string()),
        },
        github: GithubSettings {
            repo: static_conf.repo.unwrap_or_else(|| DEFAULT_REPO.to_string()),
            readme_path: static_conf
                .readme_path
                .unwrap_or_else(|| DEFAULT_README_PATH.to_string()),
            token: github_token,
            api_url: static_conf
                .github_api_url
                .unwrap_or_else(|| GITHUB_API_URL.to_string()),
        },
        slack_webhook_url,
        harvest,
    };

    info!(
        repo = %settings.github.repo,
        database_id = %settings.notion.database_id,
        "Config loaded and merged successfully"
    );
    Ok(settings)
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;

    // An empty file deserialises to unit, not to a mapping.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            anyhow!("Failed to parse config YAML: {e}")
        })
        .inspect(|_| info!(config_path = ?path, "Parsed config YAML successfully"))
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow!("{name} environment variable is empty"))
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable not set");
            Err(e).with_context(|| format!("{name} environment variable not set"))
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
