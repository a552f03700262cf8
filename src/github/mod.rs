//! GitHub access: public repository listings and source archives.

mod archive;

pub use archive::{summarize_archive, CodeSample, RepoSummary};

use crate::config::GitHubConfig;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Language recorded when GitHub reports none
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Domain a repository URL must point at
const HOSTING_DOMAIN: &str = "github.com";

/// Branches tried, in order, when downloading an archive
const ARCHIVE_BRANCHES: [&str; 2] = ["main", "master"];

/// A public repository as listed by GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub url: String,
    pub language: String,
}

#[derive(Deserialize)]
struct RepoListing {
    html_url: String,
    language: Option<String>,
}

impl From<RepoListing> for RemoteRepository {
    fn from(listing: RepoListing) -> Self {
        Self {
            url: listing.html_url,
            language: listing
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        }
    }
}

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Invalid GitHub URL: {0}")]
    NotGitHub(String),
    #[error("Invalid GitHub URL: {0} does not name an owner and repository")]
    MissingSegments(String),
}

/// Split a repository URL into owner and name.
///
/// Trailing slashes and a `.git` suffix are ignored; the last two path
/// segments after the domain are used.
pub fn parse_repo_url(url: &str) -> Result<RepoCoordinates, UrlError> {
    let Some(index) = url.find(HOSTING_DOMAIN) else {
        return Err(UrlError::NotGitHub(url.to_string()));
    };

    let path = url[index + HOSTING_DOMAIN.len()..].trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., owner, name] => Ok(RepoCoordinates {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(UrlError::MissingSegments(url.to_string())),
    }
}

/// Client for the GitHub REST API and archive downloads
pub struct GitHubClient {
    client: Client,
    api_url: String,
    archive_url: String,
    per_page: u32,
    archive_timeout: Duration,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            archive_url: config.archive_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            archive_timeout: Duration::from_secs(config.archive_timeout_seconds),
        })
    }

    /// List a user's public repositories.
    ///
    /// Only the first page of the listing is read.
    pub async fn fetch_public_repos(&self, username: &str) -> Result<Vec<RemoteRepository>> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", self.api_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("GitHub API URL cannot be a base: {}", self.api_url))?
            .pop_if_empty()
            .extend(["users", username, "repos"]);

        let response = self
            .client
            .get(url)
            .query(&[("per_page", self.per_page)])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("Failed to send request to GitHub")?
            .error_for_status()
            .with_context(|| format!("GitHub rejected repository listing for {}", username))?;

        let listings: Vec<RepoListing> = response
            .json()
            .await
            .context("Failed to parse GitHub repository listing")?;

        tracing::debug!("GitHub listed {} repositories for {}", listings.len(), username);

        Ok(listings.into_iter().map(RemoteRepository::from).collect())
    }

    /// Download the zip archive of the default branch (`main`, then `master`)
    pub async fn download_archive(&self, repo: &RepoCoordinates) -> Result<Vec<u8>> {
        for branch in ARCHIVE_BRANCHES {
            let url = format!(
                "{}/{}/{}/archive/refs/heads/{}.zip",
                self.archive_url, repo.owner, repo.name, branch
            );

            let response = self
                .client
                .get(&url)
                .timeout(self.archive_timeout)
                .send()
                .await
                .with_context(|| format!("Failed to download archive from {}", url))?;

            if response.status() == StatusCode::OK {
                let bytes = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read archive from {}", url))?;
                tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
                return Ok(bytes.to_vec());
            }

            tracing::debug!("No archive for branch {} ({})", branch, response.status());
        }

        anyhow::bail!(
            "Could not download repository ZIP for {}/{}",
            repo.owner,
            repo.name
        )
    }
}
