use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// What the browser remembers about the user: the bearer token and the
/// chosen syllabus.
///
/// Written when the user authenticates or selects a syllabus, cleared on
/// logout or on any 401 from the API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// The bearer token, if the user is signed in.
    pub token: Option<Zeroizing<String>>,
    /// The selected syllabus/category identifier.
    pub category_id: Option<String>,
    /// The selected syllabus/category display name.
    pub category_name: Option<String>,
}

impl Credential {
    /// The token as a plain `&str`, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// The syllabus selection, present only when both halves are set.
    pub fn selection(&self) -> Option<SyllabusSelection> {
        SyllabusSelection::new(
            self.category_id.as_deref().unwrap_or_default(),
            self.category_name.as_deref().unwrap_or_default(),
        )
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.category_id.is_none() && self.category_name.is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("category_id", &self.category_id)
            .field("category_name", &self.category_name)
            .finish()
    }
}

/// A chosen syllabus. Both fields are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusSelection {
    pub category_id: String,
    pub category_name: String,
}

impl SyllabusSelection {
    /// Returns `None` unless both `id` and `name` are non-blank.
    pub fn new(id: &str, name: &str) -> Option<Self> {
        let id = id.trim();
        let name = name.trim();
        if id.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            category_id: id.to_string(),
            category_name: name.to_string(),
        })
    }
}
