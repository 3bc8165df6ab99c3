use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::access::{AccessDecision, NavigationOutcome};
use crate::models::content::{ContentKind, ContentRef};
use crate::models::credential::Credential;
use crate::services::access_gate::AccessGate;
use crate::services::api::{ContentSource, SubscriptionCheck};
use crate::services::credentials::CredentialStore;
use crate::services::navigation::{self, NavigationPaths, MSG_SELECT_SYLLABUS};
use crate::services::page::PageSession;
use crate::services::sessions::forced_navigation;
use crate::validation::content::validate_slug;

/// Result of opening a gated content page.
pub struct OpenedPage {
    /// What to show the user.
    pub outcome: NavigationOutcome,
    /// The content, when it could be loaded.
    pub content: Option<ContentRef>,
    /// The mounted page and its forced-navigation channel, on `Allow`.
    pub mounted: Option<(PageSession, watch::Receiver<Option<String>>)>,
}

/// Loads the `ContentRef` for a syllabus-scoped page.
///
/// A missing syllabus is reported before any network call.
pub async fn load_content<S: ContentSource>(
    source: &S,
    credential: &Credential,
    kind: ContentKind,
    slug: &str,
) -> Result<ContentRef> {
    let selection = credential
        .selection()
        .ok_or_else(|| AppError::MissingPrerequisite(MSG_SELECT_SYLLABUS.to_string()))?;
    validate_slug(slug)?;

    let detail = source
        .content_detail(kind, slug, &selection.category_id, credential.token())
        .await?
        .ok_or_else(|| AppError::NotFound("No data found".to_string()))?;

    Ok(detail.into_content_ref(kind, slug))
}

/// Full page-mount flow: load content, check access, arm the timer.
pub async fn open_page<A>(
    api: &A,
    gate: &AccessGate<A>,
    store: &dyn CredentialStore,
    paths: &NavigationPaths,
    kind: ContentKind,
    slug: &str,
) -> OpenedPage
where
    A: ContentSource + SubscriptionCheck,
{
    let credential = store.get();

    let content = match load_content(api, &credential, kind, slug).await {
        Ok(content) => content,
        Err(err) => {
            if err == AppError::Unauthenticated {
                store.clear();
            }
            tracing::warn!("⚠️ Could not load {} {}: {}", kind, slug, err);
            return OpenedPage {
                outcome: navigation::map_error(&err, paths),
                content: None,
                mounted: None,
            };
        }
    };

    let (completion, forced) = forced_navigation(&content);
    let mut page = PageSession::new();
    let decision = page
        .mount(gate, store, content.clone(), completion)
        .await
        .unwrap_or_else(|| AccessDecision::DenyUnknown("navigation cancelled".to_string()));

    let outcome = navigation::map(&decision, &kind.content_path(slug), paths);
    let mounted = decision.is_allowed().then_some((page, forced));

    OpenedPage {
        outcome,
        content: Some(content),
        mounted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use zeroize::Zeroizing;

    use crate::error::ApiError;
    use crate::models::content::ContentDetail;
    use crate::services::credentials::MemoryCredentialStore;
    use crate::services::navigation::{MSG_PLAN_INSUFFICIENT, MSG_UNAUTHENTICATED};

    /// Fake API that counts every call it receives.
    struct FakeApi {
        detail: std::result::Result<Option<ContentDetail>, ApiError>,
        subscription: std::result::Result<bool, ApiError>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(
            detail: std::result::Result<Option<ContentDetail>, ApiError>,
            subscription: std::result::Result<bool, ApiError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                detail,
                subscription,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ContentSource for FakeApi {
        async fn content_detail(
            &self,
            _kind: ContentKind,
            _slug: &str,
            _category_id: &str,
            _token: Option<&str>,
        ) -> std::result::Result<Option<ContentDetail>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.detail.clone()
        }
    }

    impl SubscriptionCheck for FakeApi {
        async fn check_subscription(
            &self,
            _token: &str,
            _kind: ContentKind,
        ) -> std::result::Result<bool, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.subscription.clone()
        }
    }

    fn paid(minutes: f64) -> ContentDetail {
        ContentDetail {
            title: Some("Quiz".into()),
            duration: Some(minutes),
            read_time: None,
            is_free: false,
            is_resumable: false,
        }
    }

    fn full_store() -> MemoryCredentialStore {
        MemoryCredentialStore::with_credential(Credential {
            token: Some(Zeroizing::new("token".to_string())),
            category_id: Some("1".into()),
            category_name: Some("Mathematics".into()),
        })
    }

    #[tokio::test]
    async fn missing_category_short_circuits_without_network() {
        let api = FakeApi::new(Ok(Some(paid(10.0))), Ok(true));
        let gate = AccessGate::new(api.clone());
        let store = MemoryCredentialStore::new();
        store.set_token("token");

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::Quiz,
            "math-quiz-1",
        )
        .await;

        assert_eq!(
            opened.outcome,
            NavigationOutcome::InlineError { message: MSG_SELECT_SYLLABUS.into() }
        );
        assert_eq!(api.calls(), 0);
        assert!(opened.mounted.is_none());
    }

    #[tokio::test]
    async fn load_content_reports_missing_prerequisite() {
        let api = FakeApi::new(Ok(Some(paid(10.0))), Ok(true));
        let credential = Credential {
            token: Some(Zeroizing::new("token".to_string())),
            ..Default::default()
        };

        let err = load_content(api.as_ref(), &credential, ContentKind::Lesson, "fractions")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingPrerequisite(_)));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn paid_quiz_without_token_goes_to_signin() {
        let api = FakeApi::new(Ok(Some(paid(10.0))), Ok(true));
        let gate = AccessGate::new(api.clone());
        let store = MemoryCredentialStore::new();
        store.set_category("1", "Mathematics");

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::Quiz,
            "math-quiz-1",
        )
        .await;

        assert_eq!(
            opened.outcome,
            NavigationOutcome::Redirect {
                to: "/signin".into(),
                message: MSG_UNAUTHENTICATED.into(),
            }
        );
        assert!(store.get().is_empty());
        assert!(opened.mounted.is_none());
    }

    #[tokio::test]
    async fn plan_insufficient_goes_to_pricing() {
        let api = FakeApi::new(
            Ok(Some(paid(10.0))),
            Err(ApiError::Status { status: 403, message: "tier".into() }),
        );
        let gate = AccessGate::new(api.clone());
        let store = full_store();

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::Quiz,
            "math-quiz-1",
        )
        .await;

        assert_eq!(
            opened.outcome,
            NavigationOutcome::Redirect {
                to: "/pricing".into(),
                message: MSG_PLAN_INSUFFICIENT.into(),
            }
        );
        assert_eq!(store.get().token(), Some("token"));
    }

    #[tokio::test]
    async fn allowed_page_is_mounted_with_timer() {
        let api = FakeApi::new(Ok(Some(paid(2.0))), Ok(true));
        let gate = AccessGate::new(api.clone());
        let store = full_store();

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::PracticeTest,
            "mock-exam-3",
        )
        .await;

        assert_eq!(
            opened.outcome,
            NavigationOutcome::Navigate { to: "/practice-tests/mock-exam-3".into() }
        );
        let (page, _) = opened.mounted.unwrap();
        assert_eq!(page.session().unwrap().remaining_seconds, 120);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn no_data_is_inline() {
        let api = FakeApi::new(Ok(None), Ok(true));
        let gate = AccessGate::new(api.clone());
        let store = full_store();

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::Video,
            "intro",
        )
        .await;

        assert_eq!(
            opened.outcome,
            NavigationOutcome::InlineError { message: "No data found".into() }
        );
    }

    #[tokio::test]
    async fn unauthorized_detail_clears_credentials() {
        let api = FakeApi::new(
            Err(ApiError::Status { status: 401, message: "expired".into() }),
            Ok(true),
        );
        let gate = AccessGate::new(api.clone());
        let store = full_store();

        let opened = open_page(
            api.as_ref(),
            &gate,
            &store,
            &NavigationPaths::default(),
            ContentKind::Lesson,
            "fractions",
        )
        .await;

        assert!(matches!(
            opened.outcome,
            NavigationOutcome::Redirect { ref to, .. } if to == "/signin"
        ));
        assert!(store.get().is_empty());
    }
}
