//! Presentation-agnostic summaries built from a tracker snapshot.
//!
//! Nothing here formats text; front ends decide how to render percentages,
//! timestamps, and missing link targets.

use chrono::{DateTime, Utc};
use tracker_core::TrackerState;
use tracker_core::model::{ChapterId, SectionId, SubjectId, TaskId, TaskLink};

/// One subject row on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSummary {
    pub id: SubjectId,
    pub title: String,
    pub icon: String,
    pub unit_count: u32,
    pub progress: u8,
}

/// What a task link still resolves to. `None` means the target is gone (or
/// was never linked).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkTargets {
    pub subject: Option<(SubjectId, String)>,
    pub chapter: Option<(ChapterId, String)>,
    pub section: Option<(SectionId, String)>,
}

/// A task with its link resolved against the current catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub link: TaskLink,
    pub targets: LinkTargets,
}

impl TaskItem {
    /// True when the task was linked to something that no longer exists.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        (self.link.subject_id.is_some() && self.targets.subject.is_none())
            || (self.link.chapter_id.is_some() && self.targets.chapter.is_none())
            || (self.link.section_id.is_some() && self.targets.section.is_none())
    }
}

/// Everything the home screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub overall_mastery: u8,
    pub subjects: Vec<SubjectSummary>,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub tasks: Vec<TaskItem>,
}

impl Dashboard {
    #[must_use]
    pub fn from_state(state: &TrackerState) -> Self {
        let tree = state.tree();
        let inbox = state.inbox();

        let subjects = tree
            .subjects()
            .iter()
            .map(|s| SubjectSummary {
                id: s.id(),
                title: s.title().to_owned(),
                icon: s.display_icon().to_owned(),
                unit_count: s.unit_count(),
                progress: s.progress(),
            })
            .collect();

        let tasks = inbox
            .tasks()
            .iter()
            .map(|task| {
                let link = task.link();
                let resolved = tree.resolve_link(link);
                let section_id = link.section_id;
                TaskItem {
                    id: task.id(),
                    title: task.title().to_owned(),
                    completed: task.completed(),
                    created_at: task.created_at(),
                    link: *link,
                    targets: LinkTargets {
                        subject: resolved.subject.map(|s| (s.id(), s.title().to_owned())),
                        chapter: resolved.chapter.map(|c| (c.id(), c.title().to_owned())),
                        section: section_id
                            .zip(resolved.section)
                            .map(|(id, found)| (id, found.title().to_owned())),
                    },
                }
            })
            .collect();

        Self {
            overall_mastery: tree.overall_mastery(),
            subjects,
            pending_tasks: inbox.pending_count(),
            completed_tasks: inbox.completed_count(),
            tasks,
        }
    }
}
