#![allow(dead_code)]

use base64::Engine;
use corpus_harvester_core::contract::{
    CandidateRepository, FilePayload, HostError, Listing, MockRepositoryHost, TreeEntry,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory repository tree used to script a [`MockRepositoryHost`].
#[derive(Default, Clone)]
pub struct Tree {
    /// Directory path (root is `""`) to its children, in listing order.
    pub dirs: HashMap<String, Vec<TreeEntry>>,
    /// Root that is a single file instead of a directory.
    pub root_file: Option<TreeEntry>,
    pub unlistable: HashSet<String>,
    /// File path to raw bytes served base64-encoded by `get_file`.
    pub files: HashMap<String, Vec<u8>>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, path: &str, children: Vec<TreeEntry>) -> Self {
        self.dirs.insert(path.to_string(), children);
        self
    }

    pub fn unlistable(mut self, path: &str) -> Self {
        self.unlistable.insert(path.to_string());
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }
}

/// Paths passed to `get_file`, in call order.
pub type FetchLog = Arc<Mutex<Vec<String>>>;

pub fn file_entry(path: &str, content: &str) -> TreeEntry {
    TreeEntry::file(path, content.len() as u64)
}

pub fn repo(owner: &str, name: &str) -> CandidateRepository {
    CandidateRepository::new(owner, name)
}

/// Expectations for `list_contents` and `get_file` backed by `tree`.
pub fn expect_tree(host: &mut MockRepositoryHost, tree: Tree) -> FetchLog {
    let tree = Arc::new(tree);
    let log: FetchLog = Arc::new(Mutex::new(Vec::new()));

    let listing_tree = tree.clone();
    host.expect_list_contents().returning(move |repo, path| {
        if listing_tree.unlistable.contains(path) {
            return Err(HostError::Status {
                url: format!("https://api.github.com/repos/{repo}/contents/{path}"),
                status: 500,
            });
        }
        if path.is_empty() {
            if let Some(root) = &listing_tree.root_file {
                return Ok(Listing::File(root.clone()));
            }
        }
        listing_tree
            .dirs
            .get(path)
            .map(|children| Listing::Directory(children.clone()))
            .ok_or_else(|| HostError::Malformed(format!("no such directory {path}")))
    });

    let file_tree = tree;
    let file_log = log.clone();
    host.expect_get_file().returning(move |_, path| {
        file_log.lock().unwrap().push(path.to_string());
        let bytes = file_tree
            .files
            .get(path)
            .ok_or_else(|| HostError::Malformed(format!("no such file {path}")))?;
        Ok(FilePayload {
            content: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            encoding: Some("base64".into()),
            size: bytes.len() as u64,
            download_url: None,
        })
    });

    log
}
