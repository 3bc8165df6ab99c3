use std::sync::Arc;

use crate::error::ApiError;
use crate::models::access::AccessDecision;
use crate::models::content::ContentRef;
use crate::services::api::SubscriptionCheck;
use crate::services::credentials::CredentialStore;

/// Decides whether the current user may open a piece of content.
///
/// One gate serves every content kind; `ContentRef::kind` selects the
/// subscription type that is checked.
pub struct AccessGate<C> {
    checker: Arc<C>,
}

impl<C> Clone for AccessGate<C> {
    fn clone(&self) -> Self {
        Self {
            checker: Arc::clone(&self.checker),
        }
    }
}

impl<C: SubscriptionCheck> AccessGate<C> {
    pub fn new(checker: Arc<C>) -> Self {
        Self { checker }
    }

    /// Checks access to `content` for whoever `store` belongs to.
    ///
    /// Free content is allowed without a network call. A missing token is
    /// treated like a 401 without asking the API. There are no retries:
    /// a denial is final for this navigation attempt.
    pub async fn check_access(
        &self,
        content: &ContentRef,
        store: &dyn CredentialStore,
    ) -> AccessDecision {
        if content.is_free {
            tracing::debug!("🆓 {} {} is free", content.kind, content.slug);
            return AccessDecision::Allow;
        }

        let epoch = store.clear_epoch();
        let credential = store.get();

        let Some(token) = credential.token() else {
            tracing::warn!("❌ No token for paid {} {}", content.kind, content.slug);
            store.clear();
            return AccessDecision::DenyUnauthenticated;
        };

        let result = self.checker.check_subscription(token, content.kind).await;
        let decision = decide(result);

        if decision == AccessDecision::DenyUnauthenticated {
            store.clear();
        } else if decision.is_allowed() && store.clear_epoch() != epoch {
            tracing::warn!("❌ Credentials cleared during access check for {}", content.slug);
            return AccessDecision::DenyUnauthenticated;
        }

        match &decision {
            AccessDecision::Allow => {
                tracing::info!("✅ Access granted: {} {}", content.kind, content.slug)
            }
            AccessDecision::DenyUnknown(detail) => {
                tracing::error!("❌ Subscription check failed for {}: {}", content.slug, detail)
            }
            denied => tracing::warn!("🚫 Access denied for {}: {:?}", content.slug, denied),
        }

        decision
    }
}

/// Maps a subscription-check response to a decision.
///
/// 401, 403 and 404 lead to three different places and must stay distinct.
pub fn decide(result: Result<bool, ApiError>) -> AccessDecision {
    match result {
        Ok(true) => AccessDecision::Allow,
        Ok(false) => AccessDecision::DenyNoSubscription,
        Err(err) => match err.status() {
            Some(401) => AccessDecision::DenyUnauthenticated,
            Some(403) => AccessDecision::DenyPlanInsufficient,
            Some(404) => AccessDecision::DenyNoSubscription,
            _ => AccessDecision::DenyUnknown(err.detail().to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use crate::models::content::ContentKind;
    use crate::models::credential::Credential;
    use crate::services::credentials::MemoryCredentialStore;

    /// Replays one canned response and counts calls.
    struct FakeCheck {
        response: Result<bool, ApiError>,
        calls: AtomicUsize,
    }

    impl FakeCheck {
        fn new(response: Result<bool, ApiError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SubscriptionCheck for FakeCheck {
        async fn check_subscription(&self, _token: &str, _kind: ContentKind) -> Result<bool, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: format!("status {}", code),
        }
    }

    fn paid_quiz() -> ContentRef {
        ContentRef {
            slug: "math-quiz-1".to_string(),
            kind: ContentKind::Quiz,
            is_free: false,
            is_resumable: false,
            duration_seconds: 600,
        }
    }

    fn signed_in() -> MemoryCredentialStore {
        let store = MemoryCredentialStore::new();
        store.set_token("token");
        store.set_category("1", "Mathematics");
        store
    }

    #[tokio::test]
    async fn free_content_skips_subscription_check() {
        let check = FakeCheck::new(Err(status(500)));
        let gate = AccessGate::new(check.clone());

        for kind in [
            ContentKind::Lesson,
            ContentKind::Quiz,
            ContentKind::PracticeTest,
            ContentKind::Video,
        ] {
            let content = ContentRef { kind, is_free: true, ..paid_quiz() };
            let store = MemoryCredentialStore::new();
            assert_eq!(gate.check_access(&content, &store).await, AccessDecision::Allow);
        }
        assert_eq!(check.calls(), 0);
    }

    #[test]
    fn decide_is_total_over_responses() {
        assert_eq!(decide(Ok(true)), AccessDecision::Allow);
        assert_eq!(decide(Ok(false)), AccessDecision::DenyNoSubscription);
        assert_eq!(decide(Err(status(401))), AccessDecision::DenyUnauthenticated);
        assert_eq!(decide(Err(status(403))), AccessDecision::DenyPlanInsufficient);
        assert_eq!(decide(Err(status(404))), AccessDecision::DenyNoSubscription);
        assert_eq!(
            decide(Err(status(500))),
            AccessDecision::DenyUnknown("status 500".to_string())
        );
        assert_eq!(
            decide(Err(ApiError::Network("connection refused".into()))),
            AccessDecision::DenyUnknown("connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn missing_token_denies_and_clears_without_network() {
        let check = FakeCheck::new(Ok(true));
        let gate = AccessGate::new(check.clone());
        let store = MemoryCredentialStore::with_credential(Credential {
            category_id: Some("1".into()),
            category_name: Some("Mathematics".into()),
            ..Default::default()
        });

        let decision = gate.check_access(&paid_quiz(), &store).await;

        assert_eq!(decision, AccessDecision::DenyUnauthenticated);
        assert!(store.get().is_empty());
        assert_eq!(check.calls(), 0);
    }

    #[tokio::test]
    async fn unauthorized_response_clears_credentials() {
        let check = FakeCheck::new(Err(status(401)));
        let gate = AccessGate::new(check.clone());
        let store = signed_in();

        let decision = gate.check_access(&paid_quiz(), &store).await;

        assert_eq!(decision, AccessDecision::DenyUnauthenticated);
        assert!(store.get().is_empty());
        assert_eq!(check.calls(), 1);
    }

    #[tokio::test]
    async fn forbidden_keeps_credentials() {
        let gate = AccessGate::new(FakeCheck::new(Err(status(403))));
        let store = signed_in();

        let decision = gate.check_access(&paid_quiz(), &store).await;

        assert_eq!(decision, AccessDecision::DenyPlanInsufficient);
        assert_eq!(store.get().token(), Some("token"));
    }

    /// Blocks inside the check until released.
    struct GatedCheck {
        entered: Notify,
        release: Notify,
    }

    impl SubscriptionCheck for GatedCheck {
        async fn check_subscription(&self, _token: &str, _kind: ContentKind) -> Result<bool, ApiError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn clear_during_check_prevents_allow() {
        let check = Arc::new(GatedCheck {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let gate = AccessGate::new(check.clone());
        let store = signed_in();

        let pending = {
            let gate = gate.clone();
            let store = store.clone();
            tokio::spawn(async move { gate.check_access(&paid_quiz(), &store).await })
        };

        check.entered.notified().await;
        store.clear();
        check.release.notify_one();

        assert_eq!(pending.await.unwrap(), AccessDecision::DenyUnauthenticated);
    }

    #[tokio::test]
    async fn each_check_hits_the_api_again() {
        let check = FakeCheck::new(Ok(false));
        let gate = AccessGate::new(check.clone());
        let store = signed_in();

        gate.check_access(&paid_quiz(), &store).await;
        gate.check_access(&paid_quiz(), &store).await;

        assert_eq!(check.calls(), 2);
    }
}
