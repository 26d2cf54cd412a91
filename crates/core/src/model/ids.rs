use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID value
            #[must_use]
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map($name)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name).to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a Subject
    SubjectId
);
uuid_id!(
    /// Unique identifier for a Chapter
    ChapterId
);
uuid_id!(
    /// Unique identifier for a Section or Sub-section.
    ///
    /// Sections and sub-sections share one id space so a question toggle can
    /// address either.
    SectionId
);
uuid_id!(
    /// Unique identifier for a Task
    TaskId
);

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = ChapterId::generate();
        let b = ChapterId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn subject_id_display_parses_back() {
        let id = SubjectId::generate();
        let parsed: SubjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn section_id_from_str_invalid() {
        let err = "not-a-uuid".parse::<SectionId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse SectionId from string");
    }

    #[test]
    fn task_id_debug_names_kind() {
        let id = TaskId::from_uuid(Uuid::nil());
        assert_eq!(
            format!("{id:?}"),
            "TaskId(00000000-0000-0000-0000-000000000000)"
        );
    }
}
