//! High-level pipeline (discover, walk, persist) for every configured category.
//!
//! This module orchestrates one harvesting run as described by the loaded
//! [`Config`]:
//!   - Discovers candidate repositories per category through [`Discoverer`]
//!   - Walks each candidate with [`TreeWalker`] under the per-repository budget
//!   - Aggregates a [`HarvestReport`] of what was accepted, skipped and failed
//!
//! # Error Handling
//! Failures are contained at the smallest unit of work. A search failure
//! abandons its category, a root listing failure abandons its repository, and
//! both are recorded in the report. The run itself never fails; the caller
//! is expected to have checked credentials before constructing the host.

use futures::StreamExt;
use tracing::{error, info};

use crate::config::Config;
use crate::contract::RepositoryHost;
use crate::discover::Discoverer;
use crate::filter::ContentFilter;
use crate::storage::LocalStore;
use crate::walk::{SkippedEntry, TreeWalker, WalkReport};

#[derive(Debug, Default)]
pub struct HarvestReport {
    pub categories: Vec<CategoryReport>,
}

impl HarvestReport {
    pub fn accepted_files(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.repositories.iter())
            .map(|r| r.accepted.len())
            .sum()
    }
}

#[derive(Debug)]
pub struct CategoryReport {
    pub name: String,
    pub repositories: Vec<RepositoryReport>,
    /// Search failure that ended discovery for this category.
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct RepositoryReport {
    pub repository: String,
    pub accepted: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    /// Root listing failure; nothing was harvested from this repository.
    pub error: Option<String>,
}

impl From<WalkReport> for RepositoryReport {
    fn from(walk: WalkReport) -> Self {
        Self {
            repository: walk.repository,
            accepted: walk.accepted,
            skipped: walk.skipped,
            error: None,
        }
    }
}

pub async fn harvest<H>(config: &Config, host: &H) -> HarvestReport
where
    H: RepositoryHost + ?Sized,
{
    info!(
        categories = config.categories.len(),
        output_dir = %config.output_dir.display(),
        "[HARVEST] Starting harvesting run"
    );
    let filter = ContentFilter::from_config(config);
    let store = LocalStore::new(&config.output_dir);
    let walker =
        TreeWalker::new(host, &filter, &store).with_entry_cap(config.max_entries_per_repo);
    let discoverer = Discoverer::new(host, config.max_repos_per_category);

    let mut report = HarvestReport::default();
    for category in &config.categories {
        info!(category = %category.name, query = %category.query, "[HARVEST] Searching");
        let dir_name = category.dir_name();
        let mut category_report = CategoryReport {
            name: category.name.clone(),
            repositories: Vec::new(),
            error: None,
        };

        let candidates = discoverer.discover(category);
        futures::pin_mut!(candidates);
        while let Some(candidate) = candidates.next().await {
            let repo = match candidate {
                Ok(repo) => repo,
                Err(e) => {
                    error!(category = %category.name, error = %e, "[HARVEST][ERROR] Search failed");
                    category_report.error = Some(e.to_string());
                    break;
                }
            };
            match walker.walk(&dir_name, &repo, config.max_files_per_repo).await {
                Ok(walk) => category_report.repositories.push(walk.into()),
                Err(e) => {
                    error!(repo = %repo, error = %e, "[HARVEST][ERROR] Accessing repository failed");
                    category_report.repositories.push(RepositoryReport {
                        repository: repo.full_name(),
                        accepted: Vec::new(),
                        skipped: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            category = %category.name,
            repositories = category_report.repositories.len(),
            failed = category_report.error.is_some(),
            "[HARVEST] Category finished"
        );
        report.categories.push(category_report);
    }

    info!(
        accepted = report.accepted_files(),
        "[HARVEST] Harvesting run complete"
    );
    report
}
