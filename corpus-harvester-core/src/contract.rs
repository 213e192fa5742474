#![allow(unused)]

//! # contract: shared data model and the seams to the outside world
//!
//! This module holds the plain data types that flow through the pipeline
//! (candidate repositories, tree entries, harvested files, skip reasons) and
//! the traits behind which every external collaborator sits:
//!
//! - [`RepositoryHost`]: search, list, fetch and download against a code host.
//! - [`Trainer`] and [`Generator`]: the model training and text generation
//!   collaborators that consume the merged corpus and the trained model.
//!
//! ## Mocking & Testing
//! - Each trait is annotated for `mockall` so tests can script host responses.
//! - The mocks are exported behind the `test-export-mocks` feature for use in
//!   integration tests of dependent crates.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

use mockall::{automock, predicate::*};

use crate::config::Config;

/// A repository returned by discovery, identified by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRepository {
    pub owner: String,
    pub name: String,
    /// Popularity metric the search was ranked by.
    pub stars: u64,
}

impl CandidateRepository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            stars: 0,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for CandidateRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, submodules and anything else the walker does not descend into.
    Other,
}

/// One node of a repository tree, as returned by a contents listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
    /// Byte size; only meaningful for files.
    pub size: u64,
    /// Raw download reference, used when the inline payload can't be decoded.
    pub download_url: Option<String>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            download_url: None,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            download_url: None,
        }
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }
}

/// A contents listing is either a single file or the children of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    File(TreeEntry),
    Directory(Vec<TreeEntry>),
}

impl Listing {
    /// Normalise both shapes to a list, preserving the listing order.
    pub fn into_entries(self) -> Vec<TreeEntry> {
        match self {
            Listing::File(entry) => vec![entry],
            Listing::Directory(entries) => entries,
        }
    }
}

/// Inline file payload returned by the primary retrieval path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePayload {
    /// Encoded content, if the host inlined it.
    pub content: Option<String>,
    /// Encoding of `content`, e.g. `base64`.
    pub encoding: Option<String>,
    pub size: u64,
    pub download_url: Option<String>,
}

/// Result of a plain GET against a download reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Download {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A file that passed every filter and was retrieved as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedFile {
    pub category: String,
    /// `owner/name` of the source repository.
    pub repository: String,
    pub relative_path: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Why a single unit of work (file or directory) was not harvested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("size {size} is not below the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("primary retrieval failed: {0}")]
    PrimaryFailed(String),
    #[error("content could not be decoded as text: {0}")]
    Undecodable(String),
    #[error("fallback download failed: {0}")]
    DownloadFailed(String),
    #[error("fallback download returned status {0}")]
    DownloadStatus(u16),
    #[error("file is empty")]
    Empty,
    #[error("directory listing failed: {0}")]
    Listing(String),
    #[error("write failed: {0}")]
    Write(String),
}

/// Access to a repository hosting service.
///
/// Implemented by the GitHub client in the CLI crate and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// One page (1-based) of repositories matching `query`, most stars first.
    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CandidateRepository>, HostError>;

    /// List `path` in `repo`; the empty path is the repository root.
    async fn list_contents(
        &self,
        repo: &CandidateRepository,
        path: &str,
    ) -> Result<Listing, HostError>;

    /// Fetch the inline payload of a single file.
    async fn get_file(
        &self,
        repo: &CandidateRepository,
        path: &str,
    ) -> Result<FilePayload, HostError>;

    /// Plain GET of a download reference. Non-2xx statuses are returned, not raised.
    async fn download(&self, url: &str) -> Result<Download, HostError>;
}

/// Everything the training collaborator needs to fit a model to the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRequest {
    pub base_model: String,
    pub corpus_path: PathBuf,
    pub output_dir: PathBuf,
    pub epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub block_size: u32,
}

impl TrainingRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_model: config.training.base_model.clone(),
            corpus_path: config.corpus_path.clone(),
            output_dir: config.model_dir.clone(),
            epochs: config.training.epochs,
            batch_size: config.training.batch_size,
            learning_rate: config.training.learning_rate,
            block_size: config.training.block_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model_dir: PathBuf,
    pub prompt: String,
    pub max_length: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("no {0} command configured")]
    NotConfigured(&'static str),
    #[error("input not found: {0}")]
    MissingInput(PathBuf),
    #[error("model not loaded from {0}; did you train it first?")]
    ModelMissing(PathBuf),
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("unreadable output: {0}")]
    Output(String),
}

/// The external model training subsystem.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Trainer: Send + Sync {
    async fn train(&self, request: &TrainingRequest) -> Result<(), CollaboratorError>;
}

/// The external text generation wrapper around a trained model directory.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CollaboratorError>;
}
