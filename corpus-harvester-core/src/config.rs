use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// A named corpus partition and the search query that discovers its repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub query: String,
}

impl Category {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }

    /// Directory name of this category under the output root.
    pub fn dir_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Run configuration. Built once at startup and passed by reference into every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the harvested tree: `<output_dir>/<category>/<owner>/<repo>/<path>`.
    pub output_dir: PathBuf,
    /// Destination of the merged corpus file.
    pub corpus_path: PathBuf,
    /// Directory the training collaborator writes the model to.
    pub model_dir: PathBuf,
    pub categories: Vec<Category>,
    /// Accepted file suffixes, matched case-sensitively.
    pub extensions: Vec<String>,
    pub max_repos_per_category: usize,
    pub max_files_per_repo: usize,
    /// Files must be strictly smaller than this.
    pub max_file_size_bytes: u64,
    /// Cap on tree entries dequeued per repository. `None` means unbounded.
    pub max_entries_per_repo: Option<usize>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub training: TrainingConfig,
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dataset/raw"),
            corpus_path: PathBuf::from("dataset/processed/train_dataset.txt"),
            model_dir: PathBuf::from("models/wanz-flash"),
            categories: vec![
                Category::new(
                    "nextjs",
                    "nextjs component language:TypeScript stars:>1000",
                ),
                Category::new("react", "react component language:TypeScript stars:>1000"),
            ],
            extensions: [".tsx", ".ts", ".js", ".jsx", ".css"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_repos_per_category: 5,
            max_files_per_repo: 30,
            max_file_size_bytes: 500_000,
            max_entries_per_repo: None,
            api_base_url: "https://api.github.com".to_string(),
            request_timeout_secs: 30,
            training: TrainingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            corpus_path = %self.corpus_path.display(),
            categories_count = self.categories.len(),
            extensions = ?self.extensions,
            max_repos_per_category = self.max_repos_per_category,
            max_files_per_repo = self.max_files_per_repo,
            max_file_size_bytes = self.max_file_size_bytes,
            "Loaded Config"
        );
        debug!(config = ?self, "Config loaded (full debug)");
    }
}

/// Hyperparameters handed to the external training collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub base_model: String,
    pub batch_size: u32,
    pub epochs: u32,
    pub learning_rate: f64,
    pub block_size: u32,
    /// Program and leading arguments of the training command.
    pub command: Vec<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            base_model: "distilgpt2".to_string(),
            batch_size: 4,
            epochs: 3,
            learning_rate: 2e-5,
            block_size: 1000,
            command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Program and leading arguments of the generation command.
    pub command: Vec<String>,
    pub max_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            max_length: 200,
        }
    }
}
