use serde::Serialize;

/// Result of one access check. Never cached: subscription state can change
/// between two navigation attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "detail", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    DenyUnauthenticated,
    DenyNoSubscription,
    DenyPlanInsufficient,
    DenyUnknown(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// What the user sees after an access attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Show the requested content page.
    Navigate { to: String },
    /// Send the user elsewhere with a toast.
    Redirect { to: String, message: String },
    /// Stay on the page and render the message inline.
    InlineError { message: String },
}
