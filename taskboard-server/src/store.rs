//! In-memory authoritative task store.
//!
//! The [`TaskStore`] owns the single source of truth for the board: the
//! insertion-ordered task collection and the id counter. All mutation goes
//! through its five operations; nothing else reads or writes the collection
//! directly. The store is a plain owned struct with no interior locking, so
//! tests construct isolated instances and the sync engine decides how to
//! share it.

use chrono::Utc;
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

/// Errors that can occur when applying a mutation to the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced task id is absent from the collection.
    #[error("Task not found")]
    NotFound {
        /// The id that was looked up.
        id: TaskId,
    },
}

/// Authoritative in-memory task collection with monotonic id assignment.
///
/// Ids start at 1 and are never reused, even after deletion; only
/// [`TaskStore::reset`] rewinds the counter. `list_all` order is insertion
/// order, and neither update nor delete reorders the remaining tasks.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// Creates a new, empty store. The first created task gets id 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Returns the full current collection in insertion order.
    #[must_use]
    pub fn list_all(&self) -> &[Task] {
        &self.tasks
    }

    /// Creates a task from a draft: assigns the next id, stamps the creation
    /// time, appends to the collection, and returns the new record.
    ///
    /// Always succeeds; the draft's enumerated defaults already filled any
    /// fields the client omitted.
    pub fn create(&mut self, draft: TaskDraft) -> &Task {
        let task = Task {
            id: TaskId::new(self.next_id),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            category: draft.category,
            attachments: draft.attachments,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.tasks.push(task);
        // Push cannot leave the vec empty; index the tail directly.
        &self.tasks[self.tasks.len() - 1]
    }

    /// Shallow-merges a patch over the task it targets and returns the
    /// updated record. Fields absent from the patch are untouched; present
    /// fields fully replace the stored value. Never reorders the collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has the patch's id.
    pub fn update(&mut self, patch: TaskPatch) -> Result<&Task, StoreError> {
        let id = patch.id;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(attachments) = patch.attachments {
            task.attachments = attachments;
        }
        Ok(task)
    }

    /// Sets a task's status, leaving every other field untouched. Returns
    /// the `(id, status)` pair for broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has the given id.
    pub fn move_task(
        &mut self,
        id: TaskId,
        new_status: TaskStatus,
    ) -> Result<(TaskId, TaskStatus), StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;
        task.status = new_status;
        Ok((id, new_status))
    }

    /// Removes a task by id, returning the removed id. The remaining tasks
    /// keep their relative order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has the given id.
    pub fn delete(&mut self, id: TaskId) -> Result<TaskId, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;
        self.tasks.remove(index);
        Ok(id)
    }

    /// Clears the collection and rewinds the id counter to 1.
    ///
    /// Used to establish a clean state boundary, e.g. before a test
    /// scenario. Always succeeds.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.next_id = 1;
    }
}
