//! Bounded breadth-first traversal of one repository.
//!
//! The walk state is the frontier (pending entries, in discovery order) and the
//! number of accepted files. Before every dequeue the walker checks
//! `frontier non-empty && accepted < budget`, so a directory whose children
//! were just enqueued never consumes budget by itself. Only files that pass
//! the extension filter, are retrieved as text and are written to disk count.

use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::contract::{
    CandidateRepository, EntryKind, HarvestedFile, HostError, RepositoryHost, SkipReason,
    TreeEntry,
};
use crate::filter::ContentFilter;
use crate::retrieve::{Fetched, Retriever};
use crate::storage::LocalStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of walking one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub repository: String,
    /// Relative paths of accepted files, in acceptance order.
    pub accepted: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    /// Entries taken off the frontier, directories included.
    pub dequeued: usize,
    /// Set when the walk stopped at `max_entries_per_repo`.
    pub entry_cap_reached: bool,
}

impl WalkReport {
    fn skip(&mut self, path: &str, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            path: path.to_string(),
            reason,
        });
    }
}

pub struct TreeWalker<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    filter: &'a ContentFilter,
    store: &'a LocalStore,
    max_entries: Option<usize>,
}

impl<'a, H: RepositoryHost + ?Sized> TreeWalker<'a, H> {
    pub fn new(host: &'a H, filter: &'a ContentFilter, store: &'a LocalStore) -> Self {
        Self {
            host,
            filter,
            store,
            max_entries: None,
        }
    }

    /// Stop a walk after `cap` dequeued entries, whatever their outcome.
    pub fn with_entry_cap(mut self, cap: Option<usize>) -> Self {
        self.max_entries = cap;
        self
    }

    /// Walk `repo`, persisting at most `budget` accepted files under `category`.
    ///
    /// Fails only when the repository root can't be listed.
    pub async fn walk(
        &self,
        category: &str,
        repo: &CandidateRepository,
        budget: usize,
    ) -> Result<WalkReport, HostError> {
        info!(repo = %repo, category, budget, "Processing repo");
        let root = self.host.list_contents(repo, "").await?;

        let mut frontier: VecDeque<TreeEntry> = root.into_entries().into();
        let mut accepted = 0usize;
        let mut report = WalkReport {
            repository: repo.full_name(),
            ..WalkReport::default()
        };
        let retriever = Retriever::new(self.host, self.filter);

        while !frontier.is_empty() && accepted < budget {
            if let Some(cap) = self.max_entries {
                if report.dequeued >= cap {
                    warn!(repo = %repo, cap, pending = frontier.len(), "Entry cap reached, stopping walk");
                    report.entry_cap_reached = true;
                    break;
                }
            }
            let Some(entry) = frontier.pop_front() else {
                break;
            };
            report.dequeued += 1;

            match entry.kind {
                EntryKind::Directory => match self.host.list_contents(repo, &entry.path).await {
                    Ok(listing) => frontier.extend(listing.into_entries()),
                    Err(e) => {
                        debug!(repo = %repo, path = %entry.path, error = %e, "Directory listing failed, skipping");
                        report.skip(&entry.path, SkipReason::Listing(e.to_string()));
                    }
                },
                EntryKind::File => {
                    if !self.filter.qualifies_by_extension(&entry.path) {
                        continue;
                    }
                    match retriever.fetch(repo, &entry).await {
                        Fetched::Text(content) => {
                            let file = HarvestedFile {
                                category: category.to_string(),
                                repository: repo.full_name(),
                                relative_path: entry.path.clone(),
                                content,
                            };
                            match self.store.save(&file) {
                                Ok(_) => {
                                    accepted += 1;
                                    report.accepted.push(entry.path);
                                }
                                Err(e) => report.skip(&entry.path, SkipReason::Write(e.to_string())),
                            }
                        }
                        Fetched::Skipped(reason) => report.skip(&entry.path, reason),
                    }
                }
                EntryKind::Other => {
                    debug!(repo = %repo, path = %entry.path, "Skipping non-file entry");
                }
            }
        }

        info!(
            repo = %repo,
            accepted,
            skipped = report.skipped.len(),
            dequeued = report.dequeued,
            "Finished repo"
        );
        Ok(report)
    }
}
