//! Persisted shapes for the tracker's collections.
//!
//! Records mirror the domain types so the stores can serialize and
//! deserialize without leaking storage concerns into `tracker-core`. The JSON
//! layout is camelCase and carries no version field. Derived fields
//! (`unitCount`, `progress`, `totalQuestions`, `completedCount`) are written
//! for readers of the raw data but ignored on load; the tree re-derives them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracker_core::model::{
    Chapter, ChapterId, QuestionGrid, Section, SectionBody, SectionId, SectionKind, SubSection,
    Subject, SubjectId, Task, TaskId, TaskLink, Theme, UserProfile,
};
use tracker_core::time::from_millis;
use tracker_core::ProgressTree;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Serialize any record collection to JSON text.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

/// Parse JSON text into a record collection.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the text is not valid for `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

/// Weak links are parsed leniently: anything that is not an id is "unlinked".
fn weak_id<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

//
// ─── SUBJECTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub title: String,
    #[serde(default)]
    pub chapter_ids: Vec<ChapterId>,
    #[serde(default)]
    pub unit_count: u32,
    #[serde(default)]
    pub progress: u8,
    #[serde(default = "default_icon")]
    pub icon_name: String,
}

fn default_icon() -> String {
    tracker_core::model::DEFAULT_ICON.to_string()
}

impl SubjectRecord {
    #[must_use]
    pub fn from_subject(subject: &Subject, chapter_ids: Vec<ChapterId>) -> Self {
        Self {
            id: subject.id(),
            title: subject.title().to_owned(),
            chapter_ids,
            unit_count: subject.unit_count(),
            progress: subject.progress(),
            icon_name: subject.icon().to_owned(),
        }
    }

    #[must_use]
    pub fn into_subject(self) -> Subject {
        Subject::new(self.id, self.title, self.icon_name)
    }
}

//
// ─── SECTIONS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub id: SectionId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub total_questions: usize,
    #[serde(default)]
    pub completed_count: usize,
    #[serde(default)]
    pub questions: Vec<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_sections: Option<Vec<SectionRecord>>,
}

impl SectionRecord {
    #[must_use]
    pub fn from_section(section: &Section) -> Self {
        Self {
            id: section.id(),
            title: section.title().to_owned(),
            kind: section.kind().label().to_owned(),
            total_questions: section.total_questions(),
            completed_count: section.completed_count(),
            questions: section.questions().to_vec(),
            sub_sections: Some(
                section
                    .sub_sections()
                    .iter()
                    .map(Self::from_sub_section)
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn from_sub_section(sub: &SubSection) -> Self {
        Self {
            id: sub.id(),
            title: sub.title().to_owned(),
            kind: sub.kind().label().to_owned(),
            total_questions: sub.total_questions(),
            completed_count: sub.completed_count(),
            questions: sub.questions().to_vec(),
            sub_sections: None,
        }
    }

    /// Convert the record back into a domain `Section`.
    ///
    /// A record with children becomes a container, any other a leaf.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown kind, a record
    /// holding both its own questions and children, or children nested more
    /// than one level deep.
    pub fn into_section(self) -> Result<Section, StorageError> {
        let kind = self.kind.parse::<SectionKind>().map_err(ser)?;
        let children = self.sub_sections.unwrap_or_default();
        let body = if children.is_empty() {
            SectionBody::Leaf(QuestionGrid::from_flags(self.questions))
        } else {
            if !self.questions.is_empty() {
                return Err(StorageError::Serialization(format!(
                    "section {} has both questions and sub-sections",
                    self.id
                )));
            }
            let subs = children
                .into_iter()
                .map(SectionRecord::into_sub_section)
                .collect::<Result<Vec<_>, _>>()?;
            SectionBody::Container(subs)
        };
        Ok(Section::new(self.id, self.title, kind, body))
    }

    /// Convert the record into a leaf `SubSection`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown kind or if the
    /// record has children of its own.
    pub fn into_sub_section(self) -> Result<SubSection, StorageError> {
        if self.sub_sections.as_ref().is_some_and(|subs| !subs.is_empty()) {
            return Err(StorageError::Serialization(format!(
                "sub-section {} has nested sub-sections",
                self.id
            )));
        }
        let kind = self.kind.parse::<SectionKind>().map_err(ser)?;
        Ok(SubSection::new(
            self.id,
            self.title,
            kind,
            QuestionGrid::from_flags(self.questions),
        ))
    }
}

//
// ─── CHAPTERS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub id: ChapterId,
    pub subject_id: SubjectId,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
    #[serde(default)]
    pub progress: u8,
}

impl ChapterRecord {
    #[must_use]
    pub fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id(),
            subject_id: chapter.subject_id(),
            title: chapter.title().to_owned(),
            sections: chapter
                .sections()
                .iter()
                .map(SectionRecord::from_section)
                .collect(),
            progress: chapter.progress(),
        }
    }

    /// Convert the record back into a domain `Chapter`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any section is malformed.
    pub fn into_chapter(self) -> Result<Chapter, StorageError> {
        let sections = self
            .sections
            .into_iter()
            .map(SectionRecord::into_section)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chapter::new(self.id, self.subject_id, self.title, sections))
    }
}

//
// ─── TASKS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_chapter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_section_id: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl TaskRecord {
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        let link = task.link();
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            completed: task.completed(),
            linked_subject_id: link.subject_id.map(|id| id.to_string()),
            linked_chapter_id: link.chapter_id.map(|id| id.to_string()),
            linked_section_id: link.section_id.map(|id| id.to_string()),
            created_at: task.created_at().timestamp_millis(),
        }
    }

    /// Convert the record back into a domain `Task`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `createdAt` is out of range.
    pub fn into_task(self) -> Result<Task, StorageError> {
        let created_at = from_millis(self.created_at).ok_or_else(|| {
            StorageError::Serialization(format!("invalid createdAt: {}", self.created_at))
        })?;
        let link = TaskLink {
            subject_id: weak_id(self.linked_subject_id),
            chapter_id: weak_id(self.linked_chapter_id),
            section_id: weak_id(self.linked_section_id),
        };
        Ok(Task::from_persisted(
            self.id,
            self.title,
            self.completed,
            link,
            created_at,
        ))
    }
}

//
// ─── PROFILE & THEME ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl From<&UserProfile> for ProfileRecord {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            photo_url: profile.photo_url.clone(),
            is_anonymous: profile.is_anonymous,
        }
    }
}

impl From<ProfileRecord> for UserProfile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            uid: record.uid,
            display_name: record.display_name,
            email: record.email,
            photo_url: record.photo_url,
            is_anonymous: record.is_anonymous,
        }
    }
}

/// Themes are stored as bare words; anything unrecognised reads as light.
#[must_use]
pub fn decode_theme(raw: &str) -> Theme {
    raw.parse().unwrap_or_default()
}

//
// ─── COLLECTIONS ───────────────────────────────────────────────────────────────
//

/// Encode every subject, including the ids of its chapters.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_subjects(tree: &ProgressTree) -> Result<String, StorageError> {
    let records: Vec<SubjectRecord> = tree
        .subjects()
        .iter()
        .map(|s| SubjectRecord::from_subject(s, tree.chapters_of(s.id()).map(Chapter::id).collect()))
        .collect();
    encode(&records)
}

/// Encode every chapter with its sections inline.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_chapters(tree: &ProgressTree) -> Result<String, StorageError> {
    let records: Vec<ChapterRecord> = tree
        .chapters()
        .iter()
        .map(ChapterRecord::from_chapter)
        .collect();
    encode(&records)
}

/// Encode the task inbox in display order.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, StorageError> {
    let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from_task).collect();
    encode(&records)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the text is malformed.
pub fn decode_subjects(raw: &str) -> Result<Vec<Subject>, StorageError> {
    let records: Vec<SubjectRecord> = decode(raw)?;
    Ok(records.into_iter().map(SubjectRecord::into_subject).collect())
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the text or any chapter is malformed.
pub fn decode_chapters(raw: &str) -> Result<Vec<Chapter>, StorageError> {
    let records: Vec<ChapterRecord> = decode(raw)?;
    records.into_iter().map(ChapterRecord::into_chapter).collect()
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the text or any task is malformed.
pub fn decode_tasks(raw: &str) -> Result<Vec<Task>, StorageError> {
    let records: Vec<TaskRecord> = decode(raw)?;
    records.into_iter().map(TaskRecord::into_task).collect()
}
