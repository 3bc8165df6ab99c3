use tokio_util::sync::CancellationToken;

use crate::models::access::AccessDecision;
use crate::models::content::ContentRef;
use crate::models::session::SessionState;
use crate::services::access_gate::AccessGate;
use crate::services::api::SubscriptionCheck;
use crate::services::credentials::CredentialStore;
use crate::services::session_timer::{Completion, TimerHandle};

/// One mounted gated page: its access check and, once allowed, its timer.
///
/// The timer is armed only after the check resolves to `Allow`. Unmounting
/// cancels the timer synchronously and discards a check that is still in
/// flight.
pub struct PageSession {
    unmount: CancellationToken,
    timer: Option<TimerHandle>,
}

impl PageSession {
    pub fn new() -> Self {
        Self {
            unmount: CancellationToken::new(),
            timer: None,
        }
    }

    /// Token that unmounts this page when cancelled from elsewhere.
    pub fn unmount_token(&self) -> CancellationToken {
        self.unmount.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmount.is_cancelled()
    }

    /// Checks access and arms the session timer on `Allow`.
    ///
    /// Returns `None` when the page was unmounted before the check
    /// resolved; whatever the check would have done is dropped with it.
    /// Content without a duration is untimed and gets no timer.
    pub async fn mount<C: SubscriptionCheck>(
        &mut self,
        gate: &AccessGate<C>,
        store: &dyn CredentialStore,
        content: ContentRef,
        on_complete: Completion,
    ) -> Option<AccessDecision> {
        let decision = tokio::select! {
            biased;
            _ = self.unmount.cancelled() => {
                tracing::debug!("🚪 Page unmounted before access check resolved: {}", content.slug);
                return None;
            }
            decision = gate.check_access(&content, store) => decision,
        };

        if !decision.is_allowed() || content.duration_seconds == 0 {
            return Some(decision);
        }

        match TimerHandle::start(content, on_complete) {
            Ok(handle) => {
                self.timer = Some(handle);
                Some(decision)
            }
            Err(e) => {
                tracing::error!("❌ Failed to arm session timer: {}", e);
                Some(AccessDecision::DenyUnknown(e.to_string()))
            }
        }
    }

    /// The timed session, if one is running or has finished.
    pub fn session(&self) -> Option<SessionState> {
        self.timer.as_ref().map(TimerHandle::state)
    }

    /// Cancels the timer and any pending access check.
    pub fn unmount(&mut self) {
        self.unmount.cancel();
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Default for PageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
