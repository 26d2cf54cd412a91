use thiserror::Error;

/// Kinds of entity an operation can fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Subject,
    Chapter,
    Section,
    SubSection,
    Task,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Entity::Subject => "subject",
            Entity::Chapter => "chapter",
            Entity::Section => "section",
            Entity::SubSection => "sub-section",
            Entity::Task => "task",
        };
        f.write_str(label)
    }
}

/// Errors raised by the progress tree and task inbox.
///
/// Every variant is local and recoverable: the operation that raised it left
/// the state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("question index {index} out of range for grid of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("title cannot be empty")]
    EmptyTitle,
}

impl TrackerError {
    pub(crate) fn not_found(entity: Entity, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
