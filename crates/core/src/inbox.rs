//! Flat list of goals, newest first.

use chrono::{DateTime, Utc};

use crate::error::{Entity, TrackerError};
use crate::model::{Task, TaskId, TaskLink, clean_title};

/// The goal inbox. Tasks reference the catalogue only by id.
#[derive(Debug, Clone, Default)]
pub struct TaskInbox {
    tasks: Vec<Task>,
}

impl TaskInbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores an inbox in stored order.
    #[must_use]
    pub fn from_persisted(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed()).count()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.pending_count()
    }

    /// Prepends a new task. The link is not checked against the catalogue.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::EmptyTitle` if the title is blank.
    pub fn create_task(
        &mut self,
        title: impl Into<String>,
        link: TaskLink,
        now: DateTime<Utc>,
    ) -> Result<&Task, TrackerError> {
        let task = Task::new(TaskId::generate(), clean_title(title)?, link, now);
        self.tasks.insert(0, task);
        Ok(&self.tasks[0])
    }

    /// Flips a task's completion flag and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the task does not exist.
    pub fn toggle_task(&mut self, id: TaskId) -> Result<bool, TrackerError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| TrackerError::not_found(Entity::Task, id))?;
        task.toggle();
        Ok(task.completed())
    }

    /// Removes a task, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the task does not exist.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, TrackerError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| TrackerError::not_found(Entity::Task, id))?;
        Ok(self.tasks.remove(pos))
    }
}
