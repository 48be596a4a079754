use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What kind of entity an activity entry or bookmark points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Project,
    Session,
    Template,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Opened,
    Created,
    Updated,
    Deleted,
    Used,
}

/// Entry in the client-local recent activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub id: String,
    pub action: ActivityAction,
    pub kind: TargetKind,
    pub target_id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl RecentActivity {
    pub fn new(
        action: ActivityAction,
        kind: TargetKind,
        target_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            kind,
            target_id: target_id.into(),
            title: title.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A saved reference to a project, session, template or message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub kind: TargetKind,
    pub target_id: String,
    pub title: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(kind: TargetKind, target_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            target_id: target_id.into(),
            title: title.into(),
            tags: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn points_at(&self, kind: TargetKind, target_id: &str) -> bool {
        self.kind == kind && self.target_id == target_id
    }
}
