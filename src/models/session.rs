use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::content::ContentRef;

/// Lifecycle of a timed learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Expired,
    Cancelled,
}

impl SessionStatus {
    /// Expired and Cancelled sessions hold no timer resource.
    pub fn is_finished(self) -> bool {
        matches!(self, SessionStatus::Expired | SessionStatus::Cancelled)
    }
}

/// Point-in-time view of a timed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// The content being timed.
    pub content: ContentRef,
    /// Seconds left, recomputed from `started_at` on every tick.
    pub remaining_seconds: u64,
    /// Wall-clock arm time. `None` while idle.
    pub started_at: Option<DateTime<Utc>>,
    /// The current state.
    pub status: SessionStatus,
}

/// `mm:ss` rendering of a countdown. Minutes are neither padded nor capped.
pub fn format_clock(remaining_seconds: u64) -> String {
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(7325), "122:05");
    }
}
