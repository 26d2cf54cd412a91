use std::fmt;
use std::str::FromStr;

/// Signed-in identity handed over by an external provider.
///
/// Nothing in the tracker inspects these fields; the profile is stored and
/// returned as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub is_anonymous: bool,
}

impl UserProfile {
    /// Local-only profile used when no provider sign-in happened.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            uid: "guest".to_string(),
            display_name: Some("Guest".to_string()),
            email: None,
            photo_url: None,
            is_anonymous: true,
        }
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}
