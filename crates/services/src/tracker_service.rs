use std::sync::{Arc, Mutex, MutexGuard};

use storage::repository::KeyValueStore;
use tracker_core::model::{
    Chapter, ChapterId, Section, SectionId, SectionKind, SubSection, Subject, SubjectId, Task,
    TaskId, TaskLink,
};
use tracker_core::{Entity, Tracker, TrackerError, TrackerState};

use crate::Clock;
use crate::error::TrackerServiceError;
use crate::persistence::{Persister, load_state};

/// Owns the tracker and persists every change in the background.
///
/// Each call takes the tracker lock for its whole duration, so concurrent
/// callers see operations as one exclusive step each.
pub struct TrackerService {
    tracker: Mutex<Tracker>,
    persister: Persister,
}

impl TrackerService {
    /// Load state from `store` and start the background writer.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError` if stored state cannot be read or decoded.
    pub async fn load(
        clock: Clock,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, TrackerServiceError> {
        let state = load_state(store.as_ref()).await?;
        Ok(Self::from_state(state, clock, store))
    }

    /// Wrap an already loaded state.
    #[must_use]
    pub fn from_state(state: TrackerState, clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        let persister = Persister::spawn(store);
        let tracker = Tracker::from_state(state, clock).with_hook(persister.change_hook());
        Self {
            tracker: Mutex::new(tracker),
            persister,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tracker>, TrackerServiceError> {
        self.tracker
            .lock()
            .map_err(|_| TrackerServiceError::Poisoned)
    }

    fn with_tracker<T>(
        &self,
        op: impl FnOnce(&mut Tracker) -> Result<T, TrackerError>,
    ) -> Result<T, TrackerServiceError> {
        let mut tracker = self.lock()?;
        Ok(op(&mut tracker)?)
    }

    /// Copy of the current tree and inbox for rendering.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Poisoned` if a previous caller panicked.
    pub fn snapshot(&self) -> Result<TrackerState, TrackerServiceError> {
        Ok(self.lock()?.state().clone())
    }

    /// Wait until every change made so far has reached the store.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    // ─── Catalogue ─────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the title is blank.
    pub fn create_subject(
        &self,
        title: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Subject, TrackerServiceError> {
        self.with_tracker(|t| t.create_subject(title, icon))
    }

    /// Delete a subject and its chapters. Linked tasks are left alone.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the subject does not exist.
    pub fn delete_subject(&self, id: SubjectId) -> Result<Subject, TrackerServiceError> {
        self.with_tracker(|t| t.delete_subject(id))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the subject does not exist or
    /// the title is blank.
    pub fn create_chapter(
        &self,
        subject_id: SubjectId,
        title: impl Into<String>,
        initial_kinds: impl IntoIterator<Item = SectionKind>,
    ) -> Result<Chapter, TrackerServiceError> {
        self.with_tracker(|t| t.create_chapter(subject_id, title, initial_kinds))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the chapter does not exist.
    pub fn delete_chapter(&self, id: ChapterId) -> Result<Chapter, TrackerServiceError> {
        self.with_tracker(|t| t.delete_chapter(id))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the chapter does not exist or
    /// the title is blank.
    pub fn add_section(
        &self,
        chapter_id: ChapterId,
        title: impl Into<String>,
    ) -> Result<Section, TrackerServiceError> {
        self.with_tracker(|t| t.add_section(chapter_id, title))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the chapter does not exist or
    /// the title is blank.
    pub fn add_question_section(
        &self,
        chapter_id: ChapterId,
        title: impl Into<String>,
        kind: SectionKind,
        question_count: u32,
    ) -> Result<Section, TrackerServiceError> {
        self.with_tracker(|t| t.add_question_section(chapter_id, title, kind, question_count))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the chapter or section does
    /// not exist.
    pub fn delete_section(
        &self,
        chapter_id: ChapterId,
        section_id: SectionId,
    ) -> Result<Section, TrackerServiceError> {
        self.with_tracker(|t| t.delete_section(chapter_id, section_id))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the chapter or parent is
    /// missing, the parent already owns questions, or the title is blank.
    pub fn add_sub_section(
        &self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        title: impl Into<String>,
        question_count: u32,
    ) -> Result<SubSection, TrackerServiceError> {
        self.with_tracker(|t| t.add_sub_section(chapter_id, parent_id, title, question_count))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if any of the ids is unknown.
    pub fn delete_sub_section(
        &self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        sub_id: SectionId,
    ) -> Result<SubSection, TrackerServiceError> {
        self.with_tracker(|t| t.delete_sub_section(chapter_id, parent_id, sub_id))
    }

    /// Flip one question and return its new state.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` for an unknown id or an index
    /// outside the grid.
    pub fn toggle_question(
        &self,
        section_id: SectionId,
        index: usize,
    ) -> Result<bool, TrackerServiceError> {
        self.with_tracker(|t| t.toggle_question(section_id, index))
    }

    // ─── Inbox ─────────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the title is blank.
    pub fn create_task(
        &self,
        title: impl Into<String>,
        link: TaskLink,
    ) -> Result<Task, TrackerServiceError> {
        self.with_tracker(|t| t.create_task(title, link))
    }

    /// Create a task titled after the catalogue entries it links to, in the
    /// form `Subject - Chapter (Section)`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` with `NotFound` if any given id
    /// does not resolve, or `InvalidState` if a section is given without a
    /// chapter.
    pub fn create_linked_task(
        &self,
        subject_id: SubjectId,
        chapter_id: Option<ChapterId>,
        section_id: Option<SectionId>,
    ) -> Result<Task, TrackerServiceError> {
        self.with_tracker(|t| {
            let title = linked_title(t, subject_id, chapter_id, section_id)?;
            let link = TaskLink {
                subject_id: Some(subject_id),
                chapter_id,
                section_id,
            };
            t.create_task(title, link)
        })
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the task does not exist.
    pub fn toggle_task(&self, id: TaskId) -> Result<bool, TrackerServiceError> {
        self.with_tracker(|t| t.toggle_task(id))
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` if the task does not exist.
    pub fn delete_task(&self, id: TaskId) -> Result<Task, TrackerServiceError> {
        self.with_tracker(|t| t.delete_task(id))
    }
}

fn linked_title(
    tracker: &Tracker,
    subject_id: SubjectId,
    chapter_id: Option<ChapterId>,
    section_id: Option<SectionId>,
) -> Result<String, TrackerError> {
    let tree = tracker.tree();
    let subject = tree.subject(subject_id).ok_or_else(|| TrackerError::NotFound {
        entity: Entity::Subject,
        id: subject_id.to_string(),
    })?;
    let mut title = subject.title().to_owned();

    let Some(chapter_id) = chapter_id else {
        if section_id.is_some() {
            return Err(TrackerError::InvalidState(
                "a section link needs a chapter".into(),
            ));
        }
        return Ok(title);
    };
    let chapter = tree
        .chapter(chapter_id)
        .filter(|c| c.subject_id() == subject_id)
        .ok_or_else(|| TrackerError::NotFound {
            entity: Entity::Chapter,
            id: chapter_id.to_string(),
        })?;
    title.push_str(" - ");
    title.push_str(chapter.title());

    if let Some(section_id) = section_id {
        let link = TaskLink::to_chapter(subject_id, chapter_id).with_section(section_id);
        let section = tree
            .resolve_link(&link)
            .section
            .ok_or_else(|| TrackerError::NotFound {
                entity: Entity::Section,
                id: section_id.to_string(),
            })?;
        title.push_str(" (");
        title.push_str(section.title());
        title.push(')');
    }
    Ok(title)
}
