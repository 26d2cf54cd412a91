use chrono::{DateTime, Utc};

use crate::model::ids::{ChapterId, SectionId, SubjectId, TaskId};

/// Optional pointers from a task into the catalogue.
///
/// These are plain identifiers: nothing keeps them valid, and a lookup that
/// misses is read as "unlinked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskLink {
    pub subject_id: Option<SubjectId>,
    pub chapter_id: Option<ChapterId>,
    pub section_id: Option<SectionId>,
}

impl TaskLink {
    #[must_use]
    pub fn to_subject(subject_id: SubjectId) -> Self {
        Self {
            subject_id: Some(subject_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_chapter(subject_id: SubjectId, chapter_id: ChapterId) -> Self {
        Self {
            subject_id: Some(subject_id),
            chapter_id: Some(chapter_id),
            section_id: None,
        }
    }

    #[must_use]
    pub fn with_section(mut self, section_id: SectionId) -> Self {
        self.section_id = Some(section_id);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject_id.is_none() && self.chapter_id.is_none() && self.section_id.is_none()
    }
}

/// A goal in the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    completed: bool,
    created_at: DateTime<Utc>,
    link: TaskLink,
}

impl Task {
    #[must_use]
    pub fn new(id: TaskId, title: String, link: TaskLink, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            completed: false,
            created_at,
            link,
        }
    }

    /// Rebuilds a task read back from storage.
    #[must_use]
    pub fn from_persisted(
        id: TaskId,
        title: String,
        completed: bool,
        link: TaskLink,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            completed,
            created_at,
            link,
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn link(&self) -> &TaskLink {
        &self.link
    }

    pub(crate) fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}
