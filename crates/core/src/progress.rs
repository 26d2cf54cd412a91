//! Bottom-up aggregation of completion counts into progress percentages.
//!
//! Every function here recomputes from source data rather than applying a
//! delta, so a derived value can never drift from the flags it summarises.

use crate::model::{Chapter, Section, SectionBody};

/// Question totals for a leaf, a container, or a whole chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub total: usize,
    pub completed: usize,
}

impl Tally {
    #[must_use]
    pub fn new(total: usize, completed: usize) -> Self {
        Self { total, completed }
    }

    /// Percentage complete, 0 for an empty tally.
    #[must_use]
    pub fn percent(self) -> u8 {
        percent(self.completed, self.total)
    }
}

impl std::ops::Add for Tally {
    type Output = Tally;

    fn add(self, rhs: Tally) -> Tally {
        Tally::new(self.total + rhs.total, self.completed + rhs.completed)
    }
}

impl std::iter::Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        iter.fold(Tally::default(), |acc, t| acc + t)
    }
}

/// `round(100 * completed / total)` with halves rounded up; 0 when `total` is 0.
#[must_use]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Rounded arithmetic mean of percentages; 0 for an empty input.
#[must_use]
pub fn rounded_mean<I>(values: I) -> u8
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0_u64, 0_u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        return 0;
    }
    let rounded = (2 * sum + count) / (2 * count);
    u8::try_from(rounded).unwrap_or(100)
}

/// Rewrites a section's cached tally from its grid or its children.
pub(crate) fn settle_section(section: &mut Section) {
    let tally = match section.body_mut() {
        SectionBody::Leaf(grid) => grid.tally(),
        SectionBody::Container(children) => children.iter().map(|sub| sub.tally()).sum(),
    };
    section.set_tally(tally);
}

/// Settles every section of a chapter, then its progress percentage.
pub(crate) fn settle_chapter(chapter: &mut Chapter) {
    for section in chapter.sections_mut() {
        settle_section(section);
    }
    let tally = chapter_tally(chapter);
    chapter.set_progress(tally.percent());
}

/// Sum of all section tallies in a chapter.
#[must_use]
pub fn chapter_tally(chapter: &Chapter) -> Tally {
    chapter.sections().iter().map(Section::tally).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_empty_is_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(Tally::default().percent(), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 8), 13); // 12.5
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 10), 30);
        assert_eq!(percent(10, 10), 100);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(rounded_mean(std::iter::empty()), 0);
    }

    #[test]
    fn mean_rounds_half_up() {
        assert_eq!(rounded_mean([30, 0]), 15);
        assert_eq!(rounded_mean([25, 0]), 13); // 12.5
        assert_eq!(rounded_mean([33, 33, 34]), 33);
        assert_eq!(rounded_mean([100]), 100);
    }

    #[test]
    fn tallies_sum() {
        let total: Tally = [Tally::new(10, 3), Tally::new(5, 5)].into_iter().sum();
        assert_eq!(total, Tally::new(15, 8));
        assert_eq!(total.percent(), 53);
    }
}
