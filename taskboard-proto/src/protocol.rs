//! Sync protocol messages exchanged between board clients and the server.
//!
//! Messages travel as JSON text frames with an event envelope:
//! `{"event": "task:create", "data": {...}}`. Clients send *intents*
//! (requests to mutate the shared task list); the server applies them
//! against the authoritative store and answers with *facts* (descriptions
//! of state changes that already happened). Clients never assume an intent
//! succeeded — they converge on the broadcast fact.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

/// A client-originated request to mutate the task collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientIntent {
    /// Create a new task from a draft; cannot fail (defaults fill gaps).
    #[serde(rename = "task:create")]
    Create(TaskDraft),

    /// Shallow-merge the given fields over an existing task.
    #[serde(rename = "task:update")]
    Update(TaskPatch),

    /// Move a task to another board column (status-only mutation).
    #[serde(rename = "task:move")]
    Move {
        /// Id of the task to move.
        #[serde(rename = "taskId")]
        task_id: TaskId,
        /// Column to move it to.
        #[serde(rename = "newStatus")]
        new_status: TaskStatus,
    },

    /// Remove a task. The payload is the bare task id.
    #[serde(rename = "task:delete")]
    Delete(TaskId),
}

/// A server-originated message describing the authoritative state.
///
/// `Sync` is sent point-to-point to a connection entering the board (and
/// broadcast after a reset); `Error` goes to the originator of a failed
/// intent only. Every other fact is broadcast to all connected observers,
/// including the originator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerFact {
    /// Full current task collection, in insertion order.
    #[serde(rename = "sync:tasks")]
    Sync(Vec<Task>),

    /// A task was created; carries the full new record.
    #[serde(rename = "task:created")]
    Created(Task),

    /// A task was updated; carries the full merged record, not a diff.
    #[serde(rename = "task:updated")]
    Updated(Task),

    /// A task changed column.
    #[serde(rename = "task:moved")]
    Moved {
        /// Id of the moved task.
        #[serde(rename = "taskId")]
        task_id: TaskId,
        /// Its new column.
        #[serde(rename = "newStatus")]
        new_status: TaskStatus,
    },

    /// A task was removed. The payload is the bare task id.
    #[serde(rename = "task:deleted")]
    Deleted(TaskId),

    /// An intent failed; sent to the originating connection only.
    #[serde(rename = "error")]
    Error {
        /// Human-readable failure description.
        message: String,
    },
}
