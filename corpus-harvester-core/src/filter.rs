//! Extension and size predicates shared by the walker, the retriever and the merge.

use crate::config::Config;

/// `true` iff `size` is strictly below `budget`.
pub fn within_size_budget(size: u64, budget: u64) -> bool {
    size < budget
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    extensions: Vec<String>,
    max_file_size_bytes: u64,
}

impl ContentFilter {
    pub fn new<I, S>(extensions: I, max_file_size_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            max_file_size_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extensions.iter().cloned(), config.max_file_size_bytes)
    }

    /// Exact, case-sensitive suffix match against the accepted extensions.
    pub fn qualifies_by_extension(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    pub fn within_size_budget(&self, size: u64) -> bool {
        within_size_budget(size, self.max_file_size_bytes)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }
}
