//! Two-tier retrieval of a single file's text.
//!
//! The primary path asks the host for the inline payload and decodes it. When
//! that payload can't be read as text and the entry has a download reference,
//! the file is fetched again with a plain GET. Every failure ends in
//! [`Fetched::Skipped`]; nothing raises past [`Retriever::fetch`].

use base64::Engine;
use tracing::{debug, info, warn};

use crate::contract::{CandidateRepository, FilePayload, RepositoryHost, SkipReason, TreeEntry};
use crate::filter::ContentFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Text(String),
    Skipped(SkipReason),
}

pub struct Retriever<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    filter: &'a ContentFilter,
}

impl<'a, H: RepositoryHost + ?Sized> Retriever<'a, H> {
    pub fn new(host: &'a H, filter: &'a ContentFilter) -> Self {
        Self { host, filter }
    }

    pub async fn fetch(&self, repo: &CandidateRepository, entry: &TreeEntry) -> Fetched {
        if !self.filter.within_size_budget(entry.size) {
            info!(repo = %repo, path = %entry.path, size = entry.size, "Skipping large file");
            return Fetched::Skipped(SkipReason::TooLarge {
                size: entry.size,
                limit: self.filter.max_file_size_bytes(),
            });
        }

        let payload = match self.host.get_file(repo, &entry.path).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(repo = %repo, path = %entry.path, error = %e, "Primary retrieval failed");
                return Fetched::Skipped(SkipReason::PrimaryFailed(e.to_string()));
            }
        };

        match decode_payload(&payload) {
            Ok(text) => non_empty(text),
            Err(reason) => {
                let fallback = payload
                    .download_url
                    .as_deref()
                    .or(entry.download_url.as_deref());
                match fallback {
                    Some(url) => {
                        debug!(repo = %repo, path = %entry.path, reason = %reason, "Inline content unreadable, using download reference");
                        self.download_text(url).await
                    }
                    None => {
                        warn!(repo = %repo, path = %entry.path, reason = %reason, "Inline content unreadable and no download reference");
                        Fetched::Skipped(SkipReason::Undecodable(reason))
                    }
                }
            }
        }
    }

    async fn download_text(&self, url: &str) -> Fetched {
        let download = match self.host.download(url).await {
            Ok(download) => download,
            Err(e) => {
                warn!(url = %url, error = %e, "Fallback download failed");
                return Fetched::Skipped(SkipReason::DownloadFailed(e.to_string()));
            }
        };
        if !download.is_success() {
            warn!(url = %url, status = download.status, "Fallback download returned non-success status");
            return Fetched::Skipped(SkipReason::DownloadStatus(download.status));
        }
        match String::from_utf8(download.body) {
            Ok(text) => non_empty(text),
            Err(e) => {
                warn!(url = %url, error = %e, "Fallback download is not valid UTF-8");
                Fetched::Skipped(SkipReason::Undecodable(e.to_string()))
            }
        }
    }
}

fn non_empty(text: String) -> Fetched {
    if text.is_empty() {
        Fetched::Skipped(SkipReason::Empty)
    } else {
        Fetched::Text(text)
    }
}

/// Decode an inline base64 payload into UTF-8 text.
pub fn decode_payload(payload: &FilePayload) -> Result<String, String> {
    let content = payload
        .content
        .as_deref()
        .ok_or_else(|| "no inline content".to_string())?;
    match payload.encoding.as_deref() {
        Some("base64") => {}
        other => return Err(format!("unsupported encoding {other:?}")),
    }
    // The API wraps base64 bodies at 60 columns.
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| format!("invalid base64: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))
}
