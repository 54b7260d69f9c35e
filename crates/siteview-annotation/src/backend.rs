//! Remote persistence seam for comments

use crate::comment::{Comment, SyncState};
use siteview_core::{CommentId, Result, SiteviewError};
use std::path::{Path, PathBuf};

/// Where comments are persisted.
///
/// Errors from any method are surfaced to the caller as persistence
/// failures; the store rolls back its optimistic change.
pub trait CommentBackend {
    fn create(&mut self, comment: &Comment) -> Result<()>;

    fn delete(&mut self, id: &CommentId) -> Result<()>;

    fn list(&self) -> Result<Vec<Comment>>;
}

/// In-process backend with a failure switch
#[derive(Debug, Default)]
pub struct MemoryBackend {
    comments: Vec<Comment>,
    failing: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (e.g. network down)
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(SiteviewError::Persistence("backend unavailable".to_string()));
        }
        Ok(())
    }
}

impl CommentBackend for MemoryBackend {
    fn create(&mut self, comment: &Comment) -> Result<()> {
        self.check()?;
        let mut stored = comment.clone();
        stored.sync = SyncState::Synced;
        self.comments.push(stored);
        Ok(())
    }

    fn delete(&mut self, id: &CommentId) -> Result<()> {
        self.check()?;
        let before = self.comments.len();
        self.comments.retain(|c| &c.id != id);
        if self.comments.len() == before {
            return Err(SiteviewError::CommentNotFound(id.to_string()));
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Comment>> {
        self.check()?;
        Ok(self.comments.clone())
    }
}

/// Comments stored as a pretty-printed JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<Comment>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, comments: &[Comment]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(comments)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CommentBackend for JsonFileBackend {
    fn create(&mut self, comment: &Comment) -> Result<()> {
        let mut comments = self.read()?;
        comments.push(comment.clone());
        self.write(&comments)
    }

    fn delete(&mut self, id: &CommentId) -> Result<()> {
        let mut comments = self.read()?;
        let before = comments.len();
        comments.retain(|c| &c.id != id);
        if comments.len() == before {
            return Err(SiteviewError::CommentNotFound(id.to_string()));
        }
        self.write(&comments)
    }

    fn list(&self) -> Result<Vec<Comment>> {
        self.read()
    }
}
