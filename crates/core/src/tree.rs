//! The progress tree: subjects, their chapters, and every derived roll-up.
//!
//! Chapters are stored flat and point at their subject by id. An index from
//! subject id to chapter ids (in insertion order) is maintained alongside so
//! unit counts and subject progress never need a scan over every chapter.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Entity, TrackerError};
use crate::model::{
    Chapter, ChapterId, QuestionGrid, Section, SectionBody, SectionId, SectionKind, SubSection,
    Subject, SubjectId, TaskLink, clean_title,
};
use crate::progress::{rounded_mean, settle_chapter};

/// Subjects and chapters with their aggregates kept consistent.
#[derive(Debug, Clone, Default)]
pub struct ProgressTree {
    subjects: Vec<Subject>,
    chapters: Vec<Chapter>,
    by_subject: HashMap<SubjectId, Vec<ChapterId>>,
}

/// Whatever a task link still points at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedLink<'a> {
    pub subject: Option<&'a Subject>,
    pub chapter: Option<&'a Chapter>,
    pub section: Option<SectionRef<'a>>,
}

/// A section or sub-section found by id.
#[derive(Debug, Clone, Copy)]
pub enum SectionRef<'a> {
    Section(&'a Section),
    SubSection {
        parent: &'a Section,
        sub: &'a SubSection,
    },
}

impl SectionRef<'_> {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            SectionRef::Section(section) => section.title(),
            SectionRef::SubSection { sub, .. } => sub.title(),
        }
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        match self {
            SectionRef::Section(section) => section.total_questions(),
            SectionRef::SubSection { sub, .. } => sub.total_questions(),
        }
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        match self {
            SectionRef::Section(section) => section.completed_count(),
            SectionRef::SubSection { sub, .. } => sub.completed_count(),
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[bool] {
        match self {
            SectionRef::Section(section) => section.questions(),
            SectionRef::SubSection { sub, .. } => sub.questions(),
        }
    }
}

impl ProgressTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a tree from stored collections.
    ///
    /// Every aggregate is re-derived from the question flags and the subject
    /// index is rebuilt. Chapters whose subject no longer exists are dropped.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidState` if an id appears twice.
    pub fn from_persisted(
        subjects: Vec<Subject>,
        chapters: Vec<Chapter>,
    ) -> Result<Self, TrackerError> {
        let mut seen_subjects = HashSet::new();
        for subject in &subjects {
            if !seen_subjects.insert(subject.id()) {
                return Err(TrackerError::InvalidState(format!(
                    "duplicate subject id {}",
                    subject.id()
                )));
            }
        }

        let mut seen_chapters = HashSet::new();
        let mut seen_sections = HashSet::new();
        for chapter in &chapters {
            if !seen_chapters.insert(chapter.id()) {
                return Err(TrackerError::InvalidState(format!(
                    "duplicate chapter id {}",
                    chapter.id()
                )));
            }
            for section in chapter.sections() {
                let ids = std::iter::once(section.id())
                    .chain(section.sub_sections().iter().map(SubSection::id));
                for id in ids {
                    if !seen_sections.insert(id) {
                        return Err(TrackerError::InvalidState(format!(
                            "duplicate section id {id}"
                        )));
                    }
                }
            }
        }

        let mut tree = Self {
            subjects,
            chapters: Vec::with_capacity(chapters.len()),
            by_subject: HashMap::new(),
        };
        for subject in &tree.subjects {
            tree.by_subject.insert(subject.id(), Vec::new());
        }
        for mut chapter in chapters {
            let Some(ids) = tree.by_subject.get_mut(&chapter.subject_id()) else {
                continue;
            };
            ids.push(chapter.id());
            settle_chapter(&mut chapter);
            tree.chapters.push(chapter);
        }
        let subject_ids: Vec<SubjectId> = tree.subjects.iter().map(Subject::id).collect();
        for id in subject_ids {
            tree.refresh_subject(id);
        }
        Ok(tree)
    }

    // ─── Reads ─────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// All chapters, in creation order, across every subject.
    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id() == id)
    }

    /// Chapters of one subject, in the order they were added.
    pub fn chapters_of(&self, subject_id: SubjectId) -> impl Iterator<Item = &Chapter> + '_ {
        self.by_subject
            .get(&subject_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.chapter(*id))
    }

    /// Finds a section or sub-section anywhere in the tree.
    #[must_use]
    pub fn find_section(&self, id: SectionId) -> Option<(&Chapter, SectionRef<'_>)> {
        self.chapters.iter().find_map(|chapter| {
            chapter.sections().iter().find_map(|section| {
                if section.id() == id {
                    return Some((chapter, SectionRef::Section(section)));
                }
                section
                    .sub_section(id)
                    .map(|sub| (chapter, SectionRef::SubSection { parent: section, sub }))
            })
        })
    }

    /// Mean progress over all subjects, 0 when there are none.
    #[must_use]
    pub fn overall_mastery(&self) -> u8 {
        rounded_mean(self.subjects.iter().map(Subject::progress))
    }

    /// Looks up whatever a task link still points at. Never fails.
    #[must_use]
    pub fn resolve_link(&self, link: &TaskLink) -> ResolvedLink<'_> {
        let subject = link.subject_id.and_then(|id| self.subject(id));
        let chapter = link.chapter_id.and_then(|id| self.chapter(id));
        let section = link.section_id.and_then(|id| match chapter {
            Some(chapter) => chapter.section(id).map(SectionRef::Section).or_else(|| {
                chapter.sections().iter().find_map(|parent| {
                    parent
                        .sub_section(id)
                        .map(|sub| SectionRef::SubSection { parent, sub })
                })
            }),
            None => self.find_section(id).map(|(_, found)| found),
        });
        ResolvedLink {
            subject,
            chapter,
            section,
        }
    }

    // ─── Subjects ──────────────────────────────────────────────────────────────

    /// Adds a subject with no chapters.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::EmptyTitle` if the title is blank.
    pub fn create_subject(
        &mut self,
        title: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<&Subject, TrackerError> {
        let subject = Subject::new(SubjectId::generate(), clean_title(title)?, icon);
        self.by_subject.insert(subject.id(), Vec::new());
        let idx = self.subjects.len();
        self.subjects.push(subject);
        Ok(&self.subjects[idx])
    }

    /// Removes a subject together with every chapter attached to it.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the subject does not exist.
    pub fn delete_subject(&mut self, id: SubjectId) -> Result<Subject, TrackerError> {
        let pos = self
            .subjects
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| TrackerError::not_found(Entity::Subject, id))?;
        let subject = self.subjects.remove(pos);
        self.by_subject.remove(&id);
        self.chapters.retain(|c| c.subject_id() != id);
        Ok(subject)
    }

    // ─── Chapters ──────────────────────────────────────────────────────────────

    /// Adds a chapter seeded with one empty section per requested kind.
    ///
    /// Kinds are deduplicated and laid out in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the subject does not exist, or
    /// `TrackerError::EmptyTitle` if the title is blank.
    pub fn create_chapter<I>(
        &mut self,
        subject_id: SubjectId,
        title: impl Into<String>,
        initial_kinds: I,
    ) -> Result<&Chapter, TrackerError>
    where
        I: IntoIterator<Item = SectionKind>,
    {
        if self.subject(subject_id).is_none() {
            return Err(TrackerError::not_found(Entity::Subject, subject_id));
        }
        let title = clean_title(title)?;
        let kinds: BTreeSet<SectionKind> = initial_kinds.into_iter().collect();
        let sections = kinds
            .into_iter()
            .map(|kind| Section::empty_leaf(SectionId::generate(), kind.label().to_owned(), kind))
            .collect();

        let chapter = Chapter::new(ChapterId::generate(), subject_id, title, sections);
        let chapter_id = chapter.id();
        let idx = self.chapters.len();
        self.chapters.push(chapter);
        self.by_subject
            .entry(subject_id)
            .or_default()
            .push(chapter_id);
        self.refresh_subject(subject_id);
        Ok(&self.chapters[idx])
    }

    /// Removes a chapter and re-derives its subject.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter does not exist.
    pub fn delete_chapter(&mut self, id: ChapterId) -> Result<Chapter, TrackerError> {
        let pos = self.chapter_pos(id)?;
        let chapter = self.chapters.remove(pos);
        if let Some(ids) = self.by_subject.get_mut(&chapter.subject_id()) {
            ids.retain(|cid| *cid != id);
        }
        self.refresh_subject(chapter.subject_id());
        Ok(chapter)
    }

    // ─── Sections ──────────────────────────────────────────────────────────────

    /// Appends an empty section of kind `Other`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter does not exist, or
    /// `TrackerError::EmptyTitle` if the title is blank.
    pub fn add_section(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
    ) -> Result<&Section, TrackerError> {
        let pos = self.chapter_pos(chapter_id)?;
        let section =
            Section::empty_leaf(SectionId::generate(), clean_title(title)?, SectionKind::Other);
        self.insert_section(pos, section)
    }

    /// Appends a leaf section that owns a grid of `question_count` questions.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter does not exist, or
    /// `TrackerError::EmptyTitle` if the title is blank.
    pub fn add_question_section(
        &mut self,
        chapter_id: ChapterId,
        title: impl Into<String>,
        kind: SectionKind,
        question_count: u32,
    ) -> Result<&Section, TrackerError> {
        let pos = self.chapter_pos(chapter_id)?;
        let section = Section::new(
            SectionId::generate(),
            clean_title(title)?,
            kind,
            SectionBody::Leaf(QuestionGrid::new(question_count)),
        );
        self.insert_section(pos, section)
    }

    /// Removes a top-level section and re-derives the chapter and subject.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter or section does not exist.
    pub fn delete_section(
        &mut self,
        chapter_id: ChapterId,
        section_id: SectionId,
    ) -> Result<Section, TrackerError> {
        let pos = self.chapter_pos(chapter_id)?;
        let chapter = &mut self.chapters[pos];
        let idx = chapter
            .sections()
            .iter()
            .position(|s| s.id() == section_id)
            .ok_or_else(|| TrackerError::not_found(Entity::Section, section_id))?;
        let removed = chapter.sections_mut().remove(idx);
        self.settle_from(pos);
        Ok(removed)
    }

    /// Appends a leaf sub-section under a top-level section.
    ///
    /// An empty leaf parent becomes a container on its first sub-section.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter or parent section does
    /// not exist, `TrackerError::InvalidState` if the parent already owns
    /// questions of its own, or `TrackerError::EmptyTitle` for a blank title.
    pub fn add_sub_section(
        &mut self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        title: impl Into<String>,
        question_count: u32,
    ) -> Result<&SubSection, TrackerError> {
        let pos = self.chapter_pos(chapter_id)?;
        let title = clean_title(title)?;
        let parent = self.chapters[pos]
            .section_mut(parent_id)
            .ok_or_else(|| TrackerError::not_found(Entity::Section, parent_id))?;

        let sub = SubSection::new(
            SectionId::generate(),
            title,
            SectionKind::Other,
            QuestionGrid::new(question_count),
        );
        let sub_id = sub.id();
        parent.attach(sub)?;
        self.settle_from(pos);

        self.chapters[pos]
            .section(parent_id)
            .and_then(|parent| parent.sub_section(sub_id))
            .ok_or_else(|| TrackerError::not_found(Entity::SubSection, sub_id))
    }

    /// Removes a sub-section and re-derives its parent, chapter and subject.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the chapter, parent section, or
    /// sub-section does not exist.
    pub fn delete_sub_section(
        &mut self,
        chapter_id: ChapterId,
        parent_id: SectionId,
        sub_id: SectionId,
    ) -> Result<SubSection, TrackerError> {
        let pos = self.chapter_pos(chapter_id)?;
        let parent = self.chapters[pos]
            .section_mut(parent_id)
            .ok_or_else(|| TrackerError::not_found(Entity::Section, parent_id))?;
        let removed = parent
            .detach(sub_id)
            .ok_or_else(|| TrackerError::not_found(Entity::SubSection, sub_id))?;
        self.settle_from(pos);
        Ok(removed)
    }

    // ─── Questions ─────────────────────────────────────────────────────────────

    /// Flips one question of a leaf section or sub-section.
    ///
    /// Recomputes the leaf, its container, the chapter, and the subject, in
    /// that order. Returns the new value of the flag.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown id and
    /// `TrackerError::OutOfRange` for an index outside the grid. Either way
    /// nothing changes.
    pub fn toggle_question(
        &mut self,
        section_id: SectionId,
        index: usize,
    ) -> Result<bool, TrackerError> {
        let pos = self
            .chapters
            .iter()
            .position(|c| c.contains_section(section_id))
            .ok_or_else(|| TrackerError::not_found(Entity::Section, section_id))?;
        if let Some((_, SectionRef::Section(section))) = self.find_section(section_id) {
            if section.is_container() {
                return Err(TrackerError::OutOfRange { index, len: 0 });
            }
        }

        let chapter = &mut self.chapters[pos];
        let flipped = chapter
            .sections_mut()
            .iter_mut()
            .find_map(|section| grid_for(section, section_id))
            .ok_or_else(|| TrackerError::not_found(Entity::Section, section_id))?
            .toggle(index)?;
        self.settle_from(pos);
        Ok(flipped)
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn chapter_pos(&self, id: ChapterId) -> Result<usize, TrackerError> {
        self.chapters
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| TrackerError::not_found(Entity::Chapter, id))
    }

    fn insert_section(&mut self, pos: usize, section: Section) -> Result<&Section, TrackerError> {
        let section_id = section.id();
        self.chapters[pos].sections_mut().push(section);
        self.settle_from(pos);
        self.chapters[pos]
            .section(section_id)
            .ok_or_else(|| TrackerError::not_found(Entity::Section, section_id))
    }

    /// Re-derives the chapter at `pos` and then its subject.
    fn settle_from(&mut self, pos: usize) {
        let chapter = &mut self.chapters[pos];
        settle_chapter(chapter);
        let subject_id = chapter.subject_id();
        self.refresh_subject(subject_id);
    }

    /// The single place a subject's unit count and progress are derived.
    fn refresh_subject(&mut self, subject_id: SubjectId) {
        let (unit_count, progress) = match self.by_subject.get(&subject_id) {
            Some(ids) => {
                let progress = rounded_mean(
                    ids.iter()
                        .filter_map(|id| self.chapter(*id))
                        .map(Chapter::progress),
                );
                (u32::try_from(ids.len()).unwrap_or(u32::MAX), progress)
            }
            None => (0, 0),
        };
        if let Some(subject) = self.subjects.iter_mut().find(|s| s.id() == subject_id) {
            subject.set_rollup(unit_count, progress);
        }
    }
}

/// The grid a toggle on `id` should touch, if `id` lives in this section.
fn grid_for(section: &mut Section, id: SectionId) -> Option<&mut QuestionGrid> {
    let own = section.id() == id;
    match section.body_mut() {
        SectionBody::Leaf(grid) if own => Some(grid),
        SectionBody::Leaf(_) => None,
        SectionBody::Container(_) if own => None,
        SectionBody::Container(children) => children
            .iter_mut()
            .find(|sub| sub.id() == id)
            .map(SubSection::grid_mut),
    }
}
