//! Local persistence of harvested files under `<root>/<category>/<owner>/<repo>/<path>`.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

use crate::contract::HarvestedFile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("refusing to write outside the output tree: {0}")]
    UnsafePath(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination of `file`. Every segment must be a plain name; `..`,
    /// absolute paths and empty segments are rejected.
    pub fn path_for(&self, file: &HarvestedFile) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        push_segments(&mut path, &file.category)?;
        let mut repo_parts = file.repository.split('/');
        match (repo_parts.next(), repo_parts.next(), repo_parts.next()) {
            (Some(owner), Some(name), None) => {
                push_segments(&mut path, owner)?;
                push_segments(&mut path, name)?;
            }
            _ => return Err(StoreError::UnsafePath(file.repository.clone())),
        }
        push_segments(&mut path, &file.relative_path)?;
        Ok(path)
    }

    /// Write `file`, creating parent directories. Returns the written path.
    pub fn save(&self, file: &HarvestedFile) -> Result<PathBuf, StoreError> {
        let path = self.path_for(file)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                error!(error = ?e, path = %parent.display(), "Failed to create directory for harvested file");
                StoreError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                }
            })?;
        }
        fs::write(&path, file.content.as_bytes()).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Write failed for harvested file");
            StoreError::Io {
                path: path.clone(),
                source: e,
            }
        })?;
        debug!(path = %path.display(), bytes = file.content.len(), "Saved harvested file");
        Ok(path)
    }
}

fn push_segments(path: &mut PathBuf, relative: &str) -> Result<(), StoreError> {
    if relative.is_empty() {
        return Err(StoreError::UnsafePath(relative.to_string()));
    }
    for segment in relative.split('/') {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => path.push(name),
            _ => return Err(StoreError::UnsafePath(relative.to_string())),
        }
    }
    Ok(())
}
