use crate::config::DEFAULT_PROJECT_ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organizational container for chat sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Summary fields computed by the backend
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub children_count: u32,
}

impl Project {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_PROJECT_ID
    }

    /// Whether the client offers a delete control for this project
    pub fn can_delete(&self) -> bool {
        !self.is_default()
    }
}

/// A project with its nested children, as returned by `/projects/tree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTreeNode {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub children: Vec<ProjectTreeNode>,
}

impl ProjectTreeNode {
    /// Depth-first search for a node by project id
    pub fn find(&self, id: &str) -> Option<&ProjectTreeNode> {
        if self.project.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of projects in this subtree, including this one
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ProjectTreeNode::subtree_size)
            .sum::<usize>()
    }
}

/// Create project request
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl CreateProjectRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Update project request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}
