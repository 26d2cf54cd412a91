use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;
use crate::model::ids::SectionId;
use crate::progress::Tally;

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Category of practice material a section holds.
///
/// Declaration order is the canonical order used when a chapter is created
/// with a set of initial kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Examples,
    Exercise,
    Pyqs,
    Lecture,
    Other,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Examples,
        SectionKind::Exercise,
        SectionKind::Pyqs,
        SectionKind::Lecture,
        SectionKind::Other,
    ];

    /// Kinds pre-selected when a new chapter is created.
    pub const DEFAULT_INITIAL: [SectionKind; 3] = [
        SectionKind::Examples,
        SectionKind::Exercise,
        SectionKind::Pyqs,
    ];

    /// Upper-case label, also used as the title of generated sections.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Examples => "EXAMPLES",
            SectionKind::Exercise => "EXERCISE",
            SectionKind::Pyqs => "PYQS",
            SectionKind::Lecture => "LECTURE",
            SectionKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a section kind label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section kind: {0}")]
pub struct ParseSectionKindError(String);

impl FromStr for SectionKind {
    type Err = ParseSectionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.label() == upper)
            .ok_or(ParseSectionKindError(s.to_string()))
    }
}

//
// ─── QUESTION GRID ─────────────────────────────────────────────────────────────
//

/// Fixed-size ordered sequence of completion flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionGrid {
    flags: Vec<bool>,
}

impl QuestionGrid {
    /// Creates a grid of `count` unanswered questions.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            flags: vec![false; count as usize],
        }
    }

    #[must_use]
    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Counts completed questions. Always derived from the flags.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.flags.iter().filter(|done| **done).count()
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        Tally::new(self.len(), self.completed())
    }

    /// Flips the flag at `index` and returns its new value.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::OutOfRange` if `index` is outside the grid; the
    /// grid is left unchanged.
    pub(crate) fn toggle(&mut self, index: usize) -> Result<bool, TrackerError> {
        let len = self.flags.len();
        let flag = self
            .flags
            .get_mut(index)
            .ok_or(TrackerError::OutOfRange { index, len })?;
        *flag = !*flag;
        Ok(*flag)
    }
}

//
// ─── SUB-SECTION ───────────────────────────────────────────────────────────────
//

/// A leaf nested one level below a container section.
///
/// Sub-sections never hold sub-sections of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubSection {
    id: SectionId,
    title: String,
    kind: SectionKind,
    grid: QuestionGrid,
}

impl SubSection {
    #[must_use]
    pub fn new(id: SectionId, title: String, kind: SectionKind, grid: QuestionGrid) -> Self {
        Self {
            id,
            title,
            kind,
            grid,
        }
    }

    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn questions(&self) -> &[bool] {
        self.grid.flags()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.grid.len()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.grid.completed()
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.grid.tally()
    }

    pub(crate) fn grid_mut(&mut self) -> &mut QuestionGrid {
        &mut self.grid
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// What a section owns: its own question grid, or a list of leaf children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Leaf(QuestionGrid),
    Container(Vec<SubSection>),
}

/// A section of a chapter.
///
/// The cached tally is rewritten by the aggregator after every mutation and is
/// never set from outside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    title: String,
    kind: SectionKind,
    tally: Tally,
    body: SectionBody,
}

impl Section {
    /// Creates a section owning the given body; the tally is derived.
    #[must_use]
    pub fn new(id: SectionId, title: String, kind: SectionKind, body: SectionBody) -> Self {
        let mut section = Self {
            id,
            title,
            kind,
            tally: Tally::default(),
            body,
        };
        crate::progress::settle_section(&mut section);
        section
    }

    /// Creates an empty leaf, the shape every new section starts with.
    #[must_use]
    pub fn empty_leaf(id: SectionId, title: String, kind: SectionKind) -> Self {
        Self::new(id, title, kind, SectionBody::Leaf(QuestionGrid::default()))
    }

    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn body(&self) -> &SectionBody {
        &self.body
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.tally.total
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tally.completed
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self.body, SectionBody::Container(_))
    }

    /// Questions owned directly by this section; empty for containers.
    #[must_use]
    pub fn questions(&self) -> &[bool] {
        match &self.body {
            SectionBody::Leaf(grid) => grid.flags(),
            SectionBody::Container(_) => &[],
        }
    }

    /// Children of a container; empty for leaves.
    #[must_use]
    pub fn sub_sections(&self) -> &[SubSection] {
        match &self.body {
            SectionBody::Leaf(_) => &[],
            SectionBody::Container(children) => children,
        }
    }

    #[must_use]
    pub fn sub_section(&self, id: SectionId) -> Option<&SubSection> {
        self.sub_sections().iter().find(|sub| sub.id() == id)
    }

    pub(crate) fn body_mut(&mut self) -> &mut SectionBody {
        &mut self.body
    }

    pub(crate) fn set_tally(&mut self, tally: Tally) {
        self.tally = tally;
    }

    /// Appends a leaf child, turning an empty leaf into a container.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidState` if this section is a leaf that
    /// already owns questions.
    pub(crate) fn attach(&mut self, sub: SubSection) -> Result<(), TrackerError> {
        match &mut self.body {
            SectionBody::Container(children) => children.push(sub),
            SectionBody::Leaf(grid) if grid.is_empty() => {
                self.body = SectionBody::Container(vec![sub]);
            }
            SectionBody::Leaf(grid) => {
                return Err(TrackerError::InvalidState(format!(
                    "section {} already owns {} questions",
                    self.id,
                    grid.len()
                )));
            }
        }
        Ok(())
    }

    /// Removes a child by id, returning it if present.
    pub(crate) fn detach(&mut self, id: SectionId) -> Option<SubSection> {
        let SectionBody::Container(children) = &mut self.body else {
            return None;
        };
        let pos = children.iter().position(|sub| sub.id() == id)?;
        Some(children.remove(pos))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(count: u32) -> SubSection {
        SubSection::new(
            SectionId::generate(),
            "Ex 1.1".into(),
            SectionKind::Other,
            QuestionGrid::new(count),
        )
    }

    #[test]
    fn kind_parses_labels_case_insensitively() {
        assert_eq!("pyqs".parse::<SectionKind>().unwrap(), SectionKind::Pyqs);
        assert_eq!(
            " EXERCISE ".parse::<SectionKind>().unwrap(),
            SectionKind::Exercise
        );
        assert!("QUIZ".parse::<SectionKind>().is_err());
    }

    #[test]
    fn grid_toggle_flips_and_counts() {
        let mut grid = QuestionGrid::new(4);
        assert!(grid.toggle(2).unwrap());
        assert!(grid.toggle(0).unwrap());
        assert_eq!(grid.completed(), 2);
        assert!(!grid.toggle(2).unwrap());
        assert_eq!(grid.completed(), 1);
    }

    #[test]
    fn grid_toggle_rejects_index_at_len() {
        let mut grid = QuestionGrid::new(3);
        let err = grid.toggle(3).unwrap_err();
        assert_eq!(err, TrackerError::OutOfRange { index: 3, len: 3 });
        assert_eq!(grid.flags(), &[false, false, false]);
    }

    #[test]
    fn attach_converts_empty_leaf_into_container() {
        let mut section =
            Section::empty_leaf(SectionId::generate(), "EXERCISE".into(), SectionKind::Exercise);
        assert!(!section.is_container());
        section.attach(sub(5)).unwrap();
        assert!(section.is_container());
        assert_eq!(section.sub_sections().len(), 1);
        assert!(section.questions().is_empty());
    }

    #[test]
    fn attach_rejects_leaf_with_questions() {
        let mut section = Section::new(
            SectionId::generate(),
            "Drill".into(),
            SectionKind::Other,
            SectionBody::Leaf(QuestionGrid::new(2)),
        );
        let err = section.attach(sub(1)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidState(_)));
        assert!(!section.is_container());
    }

    #[test]
    fn detach_keeps_container_shape() {
        let child = sub(3);
        let child_id = child.id();
        let mut section = Section::new(
            SectionId::generate(),
            "EXERCISE".into(),
            SectionKind::Exercise,
            SectionBody::Container(vec![child]),
        );
        assert_eq!(section.total_questions(), 3);
        assert!(section.detach(child_id).is_some());
        assert!(section.is_container());
        assert!(section.detach(child_id).is_none());
    }
}
