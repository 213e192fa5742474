//! # GitHub repository host
//!
//! [`GitHubClient`] implements the core [`RepositoryHost`] contract against the
//! GitHub REST API:
//!
//! - repository search (`/search/repositories`, ranked by stars)
//! - contents listing and single-file retrieval (`/repos/{owner}/{repo}/contents/{path}`)
//! - plain downloads of the `download_url` references used as a fallback
//!
//! Authentication is a bearer token read by the CLI from `GITHUB_TOKEN`.
//! Non-2xx API responses become [`HostError::Status`]. Downloads return the
//! status instead so the retriever can classify them.

use async_trait::async_trait;
use corpus_harvester_core::contract::{
    CandidateRepository, Download, EntryKind, FilePayload, HostError, Listing, RepositoryHost,
    TreeEntry,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const USER_AGENT: &str = "corpus-harvester";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

pub struct GitHubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HostError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            error!(error = ?e, base_url, "Invalid GitHub API base URL");
            HostError::Malformed(format!("invalid API base URL {base_url:?}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HostError::Malformed(format!(
                "{base_url} cannot be used as an API base URL"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HostError::Transport(e.to_string()))?;
        info!(base_url = %base_url, timeout_secs = timeout.as_secs(), "Initialized GitHubClient");
        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    /// `base_url` extended with `segments`, each percent-encoded; empty segments are dropped.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.into_iter().filter(|s| !s.is_empty()));
        }
        url
    }

    fn contents_url(&self, repo: &CandidateRepository, path: &str) -> Url {
        let prefix = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        self.endpoint(prefix.into_iter().chain(path.split('/')))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, HostError> {
        debug!(url = %url, "GitHub API request");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "GitHub API request failed");
                HostError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                url = %url,
                response_body = %body,
                "GitHub API returned error"
            );
            return Err(HostError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to parse GitHub API response");
            HostError::Malformed(e.to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    name: String,
    owner: Owner,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

impl From<SearchItem> for CandidateRepository {
    fn from(item: SearchItem) -> Self {
        Self {
            owner: item.owner.login,
            name: item.name,
            stars: item.stargazers_count,
        }
    }
}

/// A contents response is an array for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Many(Vec<ContentItem>),
    One(ContentItem),
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    download_url: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

impl From<ContentItem> for TreeEntry {
    fn from(item: ContentItem) -> Self {
        let kind = match item.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            _ => EntryKind::Other,
        };
        Self {
            path: item.path,
            kind,
            size: item.size,
            download_url: item.download_url,
        }
    }
}

impl From<ContentItem> for FilePayload {
    fn from(item: ContentItem) -> Self {
        Self {
            content: item.content,
            encoding: item.encoding,
            size: item.size,
            download_url: item.download_url,
        }
    }
}

impl From<ContentsResponse> for Listing {
    fn from(response: ContentsResponse) -> Self {
        match response {
            ContentsResponse::Many(items) => {
                Listing::Directory(items.into_iter().map(TreeEntry::from).collect())
            }
            ContentsResponse::One(item) => Listing::File(item.into()),
        }
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CandidateRepository>, HostError> {
        info!(query, page, per_page, "Searching GitHub repositories");
        let url = self.endpoint(["search", "repositories"]);
        let params = [
            ("q", query.to_string()),
            ("sort", "stars".to_string()),
            ("order", "desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        let response: SearchResponse = self.get_json(url, &params).await?;
        Ok(response.items.into_iter().map(Into::into).collect())
    }

    async fn list_contents(
        &self,
        repo: &CandidateRepository,
        path: &str,
    ) -> Result<Listing, HostError> {
        let url = self.contents_url(repo, path);
        let response: ContentsResponse = self.get_json(url, &[]).await?;
        Ok(response.into())
    }

    async fn get_file(
        &self,
        repo: &CandidateRepository,
        path: &str,
    ) -> Result<FilePayload, HostError> {
        let url = self.contents_url(repo, path);
        match self.get_json::<ContentsResponse>(url, &[]).await? {
            ContentsResponse::One(item) => Ok(item.into()),
            ContentsResponse::Many(_) => Err(HostError::Malformed(format!(
                "{repo}/{path} is a directory, expected a file"
            ))),
        }
    }

    async fn download(&self, url: &str) -> Result<Download, HostError> {
        debug!(url, "Downloading raw file");
        let response = self.http.get(url).send().await.map_err(|e| {
            error!(error = ?e, url, "Raw download failed");
            HostError::Transport(e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;
        Ok(Download {
            status,
            body: body.to_vec(),
        })
    }
}
