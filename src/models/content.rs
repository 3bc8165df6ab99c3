use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// The kinds of gated learning artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Lesson,
    Quiz,
    PracticeTest,
    Video,
}

impl ContentKind {
    /// The `type` query parameter of the subscription check.
    pub fn subscription_type(self) -> &'static str {
        match self {
            ContentKind::Lesson => "lessons",
            ContentKind::Quiz => "quizzes",
            ContentKind::PracticeTest => "practice",
            ContentKind::Video => "videos",
        }
    }

    /// Prefix of the content detail endpoint (`/{prefix}-detail/{slug}`).
    pub fn detail_prefix(self) -> &'static str {
        match self {
            ContentKind::Lesson => "lesson",
            ContentKind::Quiz => "quiz",
            ContentKind::PracticeTest => "practice-test",
            ContentKind::Video => "video",
        }
    }

    /// The portal path segment for this kind.
    pub fn route_segment(self) -> &'static str {
        match self {
            ContentKind::Lesson => "lessons",
            ContentKind::Quiz => "quizzes",
            ContentKind::PracticeTest => "practice-tests",
            ContentKind::Video => "videos",
        }
    }

    /// Page of the content itself.
    pub fn content_path(self, slug: &str) -> String {
        format!("/{}/{}", self.route_segment(), slug)
    }

    /// Forced navigation target once the timed session runs out.
    ///
    /// Exams and quizzes are auto-submitted to their result page; lessons
    /// and videos are marked complete.
    pub fn completion_path(self, slug: &str) -> String {
        match self {
            ContentKind::Quiz | ContentKind::PracticeTest => {
                format!("/{}/{}/result", self.route_segment(), slug)
            }
            ContentKind::Lesson | ContentKind::Video => {
                format!("/{}/{}/complete", self.route_segment(), slug)
            }
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_segment())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lessons" | "lesson" => Ok(ContentKind::Lesson),
            "quizzes" | "quiz" => Ok(ContentKind::Quiz),
            "practice-tests" | "practice-test" | "practice" => Ok(ContentKind::PracticeTest),
            "videos" | "video" => Ok(ContentKind::Video),
            other => Err(AppError::Validation(format!("Unknown content kind: {}", other))),
        }
    }
}

/// One learning artifact as fetched from the content listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRef {
    pub slug: String,
    pub kind: ContentKind,
    /// Free content bypasses the subscription check. Price plays no part.
    pub is_free: bool,
    pub is_resumable: bool,
    pub duration_seconds: u64,
}

/// Envelope used by every endpoint of the external API.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: bool,
    pub data: Option<T>,
}

/// The fields of a content detail payload the portal reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentDetail {
    #[serde(default)]
    pub title: Option<String>,
    /// Exam/quiz length in minutes.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Lesson read time in minutes.
    #[serde(default)]
    pub read_time: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub is_free: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_resumable: bool,
}

impl ContentDetail {
    /// Session length in seconds. `duration` wins over `read_time`.
    pub fn duration_seconds(&self) -> u64 {
        let minutes = self.duration.or(self.read_time).unwrap_or(0.0);
        if minutes.is_finite() && minutes > 0.0 {
            (minutes * 60.0).round() as u64
        } else {
            0
        }
    }

    pub fn into_content_ref(self, kind: ContentKind, slug: &str) -> ContentRef {
        ContentRef {
            slug: slug.to_string(),
            kind,
            is_free: self.is_free,
            is_resumable: self.is_resumable,
            duration_seconds: self.duration_seconds(),
        }
    }
}

/// A syllabus (category) the user can choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The API encodes booleans as `0|1`; `true`/`false` are accepted too.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        None => false,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
