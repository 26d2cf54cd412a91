mod chapter;
mod ids;
mod profile;
mod section;
mod subject;
mod task;

pub use chapter::Chapter;
pub use ids::{ChapterId, ParseIdError, SectionId, SubjectId, TaskId};
pub use profile::{Theme, UserProfile};
pub use section::{
    ParseSectionKindError, QuestionGrid, Section, SectionBody, SectionKind, SubSection,
};
pub use subject::{DEFAULT_ICON, KNOWN_ICONS, Subject};
pub use task::{Task, TaskLink};

use crate::error::TrackerError;

/// Trims a user-supplied title and rejects it if nothing is left.
///
/// # Errors
///
/// Returns `TrackerError::EmptyTitle` for empty or whitespace-only input.
pub fn clean_title(raw: impl Into<String>) -> Result<String, TrackerError> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}
