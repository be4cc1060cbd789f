//! GitHub contents API client: reads the listings README.
//!
//! The contents endpoint returns the file base64-encoded with embedded line
//! breaks; they are stripped before decoding.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gradwatch_core::contract::{ContractError, DocumentSource};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::load_config::GithubSettings;

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPO: &str = "SimplifyJobs/New-Grad-Positions";
pub const DEFAULT_README_PATH: &str = "README.md";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

pub struct GithubReadme {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl GithubReadme {
    pub fn new(settings: &GithubSettings) -> Result<Self, ContractError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("gradwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let url = format!(
            "{}/repos/{}/contents/{}",
            settings.api_url.trim_end_matches('/'),
            settings.repo,
            settings.readme_path
        );
        tracing::info!(
            url = %url,
            token_set = settings.token.is_some(),
            "Initialized GitHub README source"
        );
        Ok(Self {
            client,
            url,
            token: settings.token.clone(),
        })
    }
}

#[async_trait]
impl DocumentSource for GithubReadme {
    async fn fetch_document(&self) -> Result<String, ContractError> {
        tracing::info!(url = %self.url, "Fetching README from GitHub");
        let mut request = self.client.get(&self.url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "GitHub contents request failed");
            return Err(format!("GitHub API error {status}: {body}").into());
        }

        let payload: ContentsResponse = response.json().await?;
        decode_content(&payload)
    }
}

fn decode_content(payload: &ContentsResponse) -> Result<String, ContractError> {
    if let Some(encoding) = payload.encoding.as_deref() {
        if encoding != "base64" {
            return Err(format!("unsupported content encoding: {encoding}").into());
        }
    }
    let compact: String = payload
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    let text = String::from_utf8(bytes)?;
    tracing::debug!(bytes = text.len(), "Decoded README content");
    Ok(text)
}
