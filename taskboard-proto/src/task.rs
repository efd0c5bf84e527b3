//! Task data model for the Taskboard protocol.
//!
//! Defines the [`Task`] record held by the authoritative store, the enums
//! for its classified fields, and the two client-facing input shapes:
//! [`TaskDraft`] (create, with enumerated defaults) and [`TaskPatch`]
//! (partial update, shallow merge).
//!
//! Field names on the wire are the board's JSON vocabulary (`createdAt`,
//! `taskId`); everything else is plain lowercase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a task.
///
/// Assigned by the task store: starts at 1, increments per creation, and is
/// never reused even after deletion. Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a `TaskId` from a raw integer.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task, i.e. which board column it lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "inprogress"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Category of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Defect report.
    Bug,
    /// New functionality.
    #[default]
    Feature,
    /// Improvement to existing functionality.
    Enhancement,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bug => write!(f, "bug"),
            Self::Feature => write!(f, "feature"),
            Self::Enhancement => write!(f, "enhancement"),
        }
    }
}

/// Descriptor for an uploaded file attached to a task.
///
/// Produced by the attachment intake on a successful upload; the client
/// attaches it to a task via a subsequent create or update intent. The store
/// treats it as opaque metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Stored filename (timestamp-prefixed, unique within the blob area).
    pub filename: String,
    /// Relative retrieval path, e.g. `/uploads/1700000000000-report.pdf`.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// A task record as held by the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique, monotonically increasing identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Board column the task belongs to.
    pub status: TaskStatus,
    /// Priority level.
    pub priority: Priority,
    /// Category label.
    pub category: Category,
    /// Ordered attachment descriptors.
    pub attachments: Vec<Attachment>,
    /// Creation timestamp, set once by the store and never mutated.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Input for a create intent.
///
/// Only `title` is required on the wire; every other field falls back to an
/// enumerated default when omitted. The store turns a draft into a [`Task`]
/// by assigning the next id and stamping the creation time, so default
/// filling happens in exactly one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Task title. Not validated non-empty here; the form layer owns that.
    pub title: String,
    /// Description, default empty.
    #[serde(default)]
    pub description: String,
    /// Initial status, default `todo`.
    #[serde(default)]
    pub status: TaskStatus,
    /// Priority, default `medium`.
    #[serde(default)]
    pub priority: Priority,
    /// Category, default `feature`.
    #[serde(default)]
    pub category: Category,
    /// Attachments already uploaded for this task, default none.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Input for an update intent: the target id plus the fields to replace.
///
/// Merge semantics are shallow: a present field fully replaces the stored
/// value, an omitted field is left untouched. `id` and `createdAt` are never
/// patchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// Id of the task to update.
    pub id: TaskId,
    /// New title, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New priority, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New category, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Replacement attachment list, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl TaskPatch {
    /// Creates an empty patch targeting the given task.
    #[must_use]
    pub const fn for_task(id: TaskId) -> Self {
        Self {
            id,
            title: None,
            description: None,
            status: None,
            priority: None,
            category: None,
            attachments: None,
        }
    }
}
