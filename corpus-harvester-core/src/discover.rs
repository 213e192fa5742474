//! Lazy, rank-ordered discovery of candidate repositories for one category.

use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::config::Category;
use crate::contract::{CandidateRepository, HostError, RepositoryHost};

/// Largest page the search API serves.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct Discoverer<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    max_repos: usize,
}

struct Cursor {
    page: u32,
    buffer: VecDeque<CandidateRepository>,
    yielded: usize,
    last_page: bool,
    failed: bool,
}

impl<'a, H: RepositoryHost + ?Sized> Discoverer<'a, H> {
    pub fn new(host: &'a H, max_repos: usize) -> Self {
        Self { host, max_repos }
    }

    /// Candidates for `category`, most stars first, at most `max_repos` of them.
    ///
    /// Pages are requested only as the stream is consumed. A search error is
    /// yielded once and ends the stream.
    pub fn discover(
        &self,
        category: &'a Category,
    ) -> impl Stream<Item = Result<CandidateRepository, HostError>> + 'a {
        let host = self.host;
        let max_repos = self.max_repos;
        let per_page = page_size(max_repos);
        let cursor = Cursor {
            page: 0,
            buffer: VecDeque::new(),
            yielded: 0,
            last_page: false,
            failed: false,
        };

        stream::unfold(cursor, move |mut cursor| async move {
            if cursor.failed || cursor.yielded >= max_repos {
                return None;
            }
            if cursor.buffer.is_empty() {
                if cursor.last_page {
                    return None;
                }
                cursor.page += 1;
                info!(category = %category.name, page = cursor.page, per_page, "Searching repositories");
                match host
                    .search_repositories(&category.query, cursor.page, per_page)
                    .await
                {
                    Ok(repos) => {
                        debug!(category = %category.name, count = repos.len(), "Search page received");
                        cursor.last_page = (repos.len() as u32) < per_page;
                        cursor.buffer.extend(repos);
                    }
                    Err(e) => {
                        cursor.failed = true;
                        return Some((Err(e), cursor));
                    }
                }
            }
            let repo = cursor.buffer.pop_front()?;
            cursor.yielded += 1;
            Some((Ok(repo), cursor))
        })
    }
}

fn page_size(max_repos: usize) -> u32 {
    max_repos.clamp(1, MAX_PAGE_SIZE as usize) as u32
}
