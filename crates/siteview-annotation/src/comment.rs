//! The comment entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siteview_core::{CommentId, Vec3};

/// A world-space point a comment is pinned to
pub type Anchor = Vec3;

/// Whether the backend has acknowledged a local change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    /// Applied locally, waiting for the backend
    Pending,
    #[default]
    Synced,
}

/// A user comment, optionally anchored in the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visible_to_secondary_role: bool,
    #[serde(skip)]
    pub(crate) sync: SyncState,
}

impl Comment {
    /// A fresh comment with a new UUID, stamped now
    pub fn new(content: impl Into<String>, anchor: Option<Anchor>, author_id: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(uuid::Uuid::new_v4().to_string()),
            content: content.into(),
            anchor,
            author_id: author_id.into(),
            created_at: Utc::now(),
            visible_to_secondary_role: false,
            sync: SyncState::Pending,
        }
    }

    pub fn visible_to_secondary_role(mut self, visible: bool) -> Self {
        self.visible_to_secondary_role = visible;
        self
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }
}
