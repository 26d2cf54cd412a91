use crate::model::ids::{ChapterId, SectionId, SubjectId};
use crate::model::section::Section;

/// A unit of study under a subject, exclusively owning its sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    subject_id: SubjectId,
    title: String,
    sections: Vec<Section>,
    progress: u8,
}

impl Chapter {
    /// Creates a chapter; `progress` is derived once the chapter is settled.
    #[must_use]
    pub fn new(
        id: ChapterId,
        subject_id: SubjectId,
        title: String,
        sections: Vec<Section>,
    ) -> Self {
        let mut chapter = Self {
            id,
            subject_id,
            title,
            sections,
            progress: 0,
        };
        crate::progress::settle_chapter(&mut chapter);
        chapter
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Completion percentage across every question in the chapter.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.id() == id)
    }

    /// True if `id` names a section or a sub-section of this chapter.
    #[must_use]
    pub fn contains_section(&self, id: SectionId) -> bool {
        self.sections
            .iter()
            .any(|section| section.id() == id || section.sub_section(id).is_some())
    }

    pub(crate) fn sections_mut(&mut self) -> &mut Vec<Section> {
        &mut self.sections
    }

    pub(crate) fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.id() == id)
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        self.progress = progress;
    }
}
