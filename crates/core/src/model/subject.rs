use crate::model::ids::SubjectId;

/// Icon names a front end knows how to draw.
pub const KNOWN_ICONS: [&str; 13] = [
    "BookOpen",
    "Calculator",
    "FlaskConical",
    "Atom",
    "Dna",
    "Globe",
    "Palette",
    "Languages",
    "Cpu",
    "Music",
    "Sigma",
    "History",
    "Binary",
];

pub const DEFAULT_ICON: &str = "BookOpen";

/// A top-level area of study.
///
/// A subject does not own its chapters; chapters point back at it and the
/// tree keeps `unit_count` and `progress` in step with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: SubjectId,
    title: String,
    unit_count: u32,
    progress: u8,
    icon: String,
}

impl Subject {
    #[must_use]
    pub fn new(id: SubjectId, title: String, icon: impl Into<String>) -> Self {
        Self {
            id,
            title,
            unit_count: 0,
            progress: 0,
            icon: icon.into(),
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of chapters currently attached to this subject.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.unit_count
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Stored icon name, exactly as chosen.
    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Icon to draw: the stored name when known, the default otherwise.
    #[must_use]
    pub fn display_icon(&self) -> &str {
        if KNOWN_ICONS.contains(&self.icon.as_str()) {
            &self.icon
        } else {
            DEFAULT_ICON
        }
    }

    pub(crate) fn set_rollup(&mut self, unit_count: u32, progress: u8) {
        self.unit_count = unit_count;
        self.progress = progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_icon_falls_back_to_default() {
        let subject = Subject::new(SubjectId::generate(), "Art".into(), "Brush");
        assert_eq!(subject.icon(), "Brush");
        assert_eq!(subject.display_icon(), DEFAULT_ICON);

        let subject = Subject::new(SubjectId::generate(), "Maths".into(), "Sigma");
        assert_eq!(subject.display_icon(), "Sigma");
    }
}
