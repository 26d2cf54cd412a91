//! The engine object callers hold: tree, inbox, clock, and a change hook.

use std::fmt;

use crate::error::TrackerError;
use crate::inbox::TaskInbox;
use crate::model::{
    Chapter, ChapterId, Section, SectionId, SectionKind, SubSection, Subject, SubjectId, Task,
    TaskId, TaskLink,
};
use crate::time::Clock;
use crate::tree::ProgressTree;

/// Independently stored collections a mutation can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Subjects,
    Chapters,
    Tasks,
}

const TREE: &[Collection] = &[Collection::Subjects, Collection::Chapters];
const TASKS: &[Collection] = &[Collection::Tasks];

/// Called after every successful mutation with the new state and the
/// collections that changed. Never called when an operation fails.
pub type ChangeHook = Box<dyn FnMut(&TrackerState, &[Collection]) + Send>;

/// Everything the tracker owns.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    tree: ProgressTree,
    inbox: TaskInbox,
}

impl TrackerState {
    #[must_use]
    pub fn new(tree: ProgressTree, inbox: TaskInbox) -> Self {
        Self { tree, inbox }
    }

    #[must_use]
    pub fn tree(&self) -> &ProgressTree {
        &self.tree
    }

    #[must_use]
    pub fn inbox(&self) -> &TaskInbox {
        &self.inbox
    }
}

/// Single entry point for every catalogue and inbox mutation.
pub struct Tracker {
    state: TrackerState,
    clock: Clock,
    hook: Option<ChangeHook>,
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Tracker {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::from_state(TrackerState::default(), clock)
    }

    #[must_use]
    pub fn from_state(state: TrackerState, clock: Clock) -> Self {
        Self {
            state,
            clock,
            hook: None,
        }
    }

    #[must_use]
    pub fn with_hook(mut self, hook: ChangeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn set_hook(&mut self, hook: ChangeHook) {
        self.hook = Some(hook);
    }

    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn tree(&self) -> &ProgressTree {
        &self.state.tree
    }

    #[must_use]
    pub fn inbox(&self) -> &TaskInbox {
        &self.state.inbox
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    fn notify(&mut self, touched: &[Collection]) {
        if let Some(hook) = self.hook.as_mut() {
            hook(&self.state, touched);
        }
    }

    // ─── Catalogue ─────────────────────────────────────────────────────────────

    /// See [`ProgressTree::create_subject`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn create_subject(
        &mut self,
        title: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Subject, TrackerError> {
        let subject = self.state.tree.create_subject(title, icon)?.clone();
        self.notify(&[Collection::Subjects]);
        Ok(subject)
    }

    /// See [`ProgressTree::delete_subject`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn delete_subject(&mut self, id: SubjectId) -> Result<Subject, TrackerError> {
        let subject = self.state.tree.delete_subject(id)?;
        self.notify(TREE);
        Ok(subject)
    }

    /// See [`ProgressTree::create_chapter`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn create_chapter<I>(
        &mut self,
        subject_id: SubjectId,
        title: impl Into<String>,
        initial_kinds: I,
    ) -> Result<Chapter, TrackerError>
    where
        I: IntoIterator<Item = SectionKind>,
    {
        let chapter = self
            .state
            .tree
            .create_chapter(subject_id, title, initial_kinds)?
            .clone();
        self.notify(TREE);
        Ok(chapter)
    }

    /// See [`ProgressTree::delete_chapter`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn delete_chapter(&mut self, id: ChapterId) -> Result<Chapter, TrackerError> {
        let chapter = self.state.tree.delete_chapter(id)?;
        self.notify(TREE);
        Ok(chapter)
    }

    /// See [`ProgressTree::add_section`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn add_section(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
    ) -> Result<Section, TrackerError> {
        let section = self.state.tree.add_section(chapter_id, title)?.clone();
        self.notify(TREE);
        Ok(section)
    }

    /// See [`ProgressTree::add_question_section`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn add_question_section(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
        kind: SectionKind,
        question_count: u32,
    ) -> Result<Section, TrackerError> {
        let section = self
            .state
            .tree
            .add_question_section(chapter_id, title, kind, question_count)?
            .clone();
        self.notify(TREE);
        Ok(section)
    }

    /// See [`ProgressTree::delete_section`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn delete_section(
        &mut self,
        chapter_id: ChapterId,
        section_id: SectionId,
    ) -> Result<Section, TrackerError> {
        let section = self.state.tree.delete_section(chapter_id, section_id)?;
        self.notify(TREE);
        Ok(section)
    }

    /// See [`ProgressTree::add_sub_section`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn add_sub_section(
        &mut self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        title: impl Into<String>,
        question_count: u32,
    ) -> Result<SubSection, TrackerError> {
        let sub = self
            .state
            .tree
            .add_sub_section(chapter_id, parent_id, title, question_count)?
            .clone();
        self.notify(TREE);
        Ok(sub)
    }

    /// See [`ProgressTree::delete_sub_section`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn delete_sub_section(
        &mut self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        sub_id: SectionId,
    ) -> Result<SubSection, TrackerError> {
        let sub = self
            .state
            .tree
            .delete_sub_section(chapter_id, parent_id, sub_id)?;
        self.notify(TREE);
        Ok(sub)
    }

    /// See [`ProgressTree::toggle_question`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the tree.
    pub fn toggle_question(
        &mut self,
        section_id: SectionId,
        index: usize,
    ) -> Result<bool, TrackerError> {
        let flag = self.state.tree.toggle_question(section_id, index)?;
        self.notify(TREE);
        Ok(flag)
    }

    // ─── Inbox ─────────────────────────────────────────────────────────────────

    /// Prepends a task stamped with the tracker's clock.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::EmptyTitle` if the title is blank.
    pub fn create_task(
        &mut self,
        title: impl Into<String>,
        link: TaskLink,
    ) -> Result<Task, TrackerError> {
        let now = self.clock.now();
        let task = self.state.inbox.create_task(title, link, now)?.clone();
        self.notify(TASKS);
        Ok(task)
    }

    /// See [`TaskInbox::toggle_task`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the inbox.
    pub fn toggle_task(&mut self, id: TaskId) -> Result<bool, TrackerError> {
        let completed = self.state.inbox.toggle_task(id)?;
        self.notify(TASKS);
        Ok(completed)
    }

    /// See [`TaskInbox::delete_task`].
    ///
    /// # Errors
    ///
    /// Propagates `TrackerError` from the inbox.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, TrackerError> {
        let task = self.state.inbox.delete_task(id)?;
        self.notify(TASKS);
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::time::fixed_clock;

    type Calls = Arc<Mutex<Vec<Vec<Collection>>>>;

    fn recording_tracker() -> (Tracker, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let hook: ChangeHook = Box::new(move |_: &TrackerState, touched: &[Collection]| {
            sink.lock().unwrap().push(touched.to_vec());
        });
        let tracker = Tracker::new(fixed_clock()).with_hook(hook);
        (tracker, calls)
    }

    #[test]
    fn hook_runs_after_each_successful_mutation() {
        let (mut tracker, calls) = recording_tracker();
        let subject = tracker.create_subject("Physics", "Atom").unwrap();
        tracker
            .create_chapter(subject.id(), "Optics", SectionKind::DEFAULT_INITIAL)
            .unwrap();
        tracker.create_task("Read notes", TaskLink::default()).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                vec![Collection::Subjects],
                vec![Collection::Subjects, Collection::Chapters],
                vec![Collection::Tasks],
            ]
        );
    }

    #[test]
    fn hook_is_skipped_when_operation_fails() {
        let (mut tracker, calls) = recording_tracker();
        assert!(tracker.delete_chapter(ChapterId::generate()).is_err());
        assert!(tracker.create_subject("  ", "BookOpen").is_err());
        assert!(tracker.toggle_task(TaskId::generate()).is_err());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn hook_sees_post_mutation_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hook: ChangeHook = Box::new(move |state: &TrackerState, _: &[Collection]| {
            sink.lock().unwrap().push(state.tree().subjects().len());
        });
        let mut tracker = Tracker::new(fixed_clock()).with_hook(hook);
        let id = tracker.create_subject("Biology", "Dna").unwrap().id();
        tracker.delete_subject(id).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }

    #[test]
    fn tasks_use_tracker_clock() {
        let mut tracker = Tracker::new(fixed_clock());
        let task = tracker.create_task("Plan week", TaskLink::default()).unwrap();
        assert_eq!(task.created_at(), crate::time::fixed_now());
    }
}
