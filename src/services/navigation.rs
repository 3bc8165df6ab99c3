use crate::error::AppError;
use crate::models::access::{AccessDecision, NavigationOutcome};

pub const MSG_UNAUTHENTICATED: &str = "User is not authenticated. Please log in.";
pub const MSG_NO_SUBSCRIPTION: &str = "Please buy a subscription to access this course.";
pub const MSG_PLAN_INSUFFICIENT: &str =
    "Feature not available in your plan. Please upgrade your subscription.";
pub const MSG_SELECT_SYLLABUS: &str = "Please select a syllabus to continue.";

/// Destinations for denied access.
#[derive(Debug, Clone)]
pub struct NavigationPaths {
    pub signin: String,
    pub pricing: String,
}

impl Default for NavigationPaths {
    fn default() -> Self {
        Self {
            signin: "/signin".to_string(),
            pricing: "/pricing".to_string(),
        }
    }
}

/// Translates an access decision into what the user sees.
///
/// `target` is the content page shown on `Allow`.
pub fn map(decision: &AccessDecision, target: &str, paths: &NavigationPaths) -> NavigationOutcome {
    match decision {
        AccessDecision::Allow => NavigationOutcome::Navigate {
            to: target.to_string(),
        },
        AccessDecision::DenyUnauthenticated => NavigationOutcome::Redirect {
            to: paths.signin.clone(),
            message: MSG_UNAUTHENTICATED.to_string(),
        },
        AccessDecision::DenyNoSubscription => NavigationOutcome::Redirect {
            to: paths.pricing.clone(),
            message: MSG_NO_SUBSCRIPTION.to_string(),
        },
        AccessDecision::DenyPlanInsufficient => NavigationOutcome::Redirect {
            to: paths.pricing.clone(),
            message: MSG_PLAN_INSUFFICIENT.to_string(),
        },
        AccessDecision::DenyUnknown(detail) => NavigationOutcome::InlineError {
            message: format!("An error occurred: {}", detail),
        },
    }
}

/// Same mapping for errors raised before the gate ran (content fetch,
/// missing syllabus). Never a blank page: every error lands somewhere.
pub fn map_error(err: &AppError, paths: &NavigationPaths) -> NavigationOutcome {
    match err {
        AppError::Unauthenticated => map(&AccessDecision::DenyUnauthenticated, "", paths),
        AppError::NoSubscription => map(&AccessDecision::DenyNoSubscription, "", paths),
        AppError::PlanInsufficient => map(&AccessDecision::DenyPlanInsufficient, "", paths),
        other => NavigationOutcome::InlineError {
            message: other.to_string(),
        },
    }
}
