use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::models::content::ContentRef;
use crate::models::session::{format_clock, SessionState, SessionStatus};
use crate::services::credentials::TokenDigest;
use crate::services::page::PageSession;
use crate::services::session_timer::Completion;

/// A mounted page plus the channel its expiry publishes to.
///
/// Only requests carrying the token that opened the page may read or end
/// it. Pages opened without a token are owned by tokenless requests.
pub struct ActiveSession {
    page: PageSession,
    forced_navigation: watch::Receiver<Option<String>>,
    owner: Option<TokenDigest>,
}

impl ActiveSession {
    pub fn new(
        page: PageSession,
        forced_navigation: watch::Receiver<Option<String>>,
        owner: Option<TokenDigest>,
    ) -> Self {
        Self {
            page,
            forced_navigation,
            owner,
        }
    }
}

/// What the page polls to render its countdown.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub content: ContentRef,
    pub status: SessionStatus,
    pub remaining_seconds: u64,
    pub display: String,
    pub started_at: Option<DateTime<Utc>>,
    /// Set once the session expired: where the page must navigate.
    pub redirect: Option<String>,
}

impl SessionView {
    fn new(session_id: Uuid, state: SessionState, redirect: Option<String>) -> Self {
        Self {
            session_id,
            display: format_clock(state.remaining_seconds),
            content: state.content,
            status: state.status,
            remaining_seconds: state.remaining_seconds,
            started_at: state.started_at,
            redirect,
        }
    }
}

/// Completion that publishes the content's forced-navigation target.
pub fn forced_navigation(content: &ContentRef) -> (Completion, watch::Receiver<Option<String>>) {
    let (tx, rx) = watch::channel(None);
    let target = content.kind.completion_path(&content.slug);

    let completion: Completion = Arc::new(move |state: &SessionState| {
        tracing::info!(
            "➡️ Forcing navigation to {} after {} {} expired",
            target,
            state.content.kind,
            state.content.slug
        );
        tx.send_replace(Some(target.clone()));
    });

    (completion, rx)
}

/// Timed sessions of every mounted page, keyed by session id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, ActiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mounted page and returns its session id.
    pub async fn insert(&self, session: ActiveSession) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, session);
        tracing::debug!("🗂️ Session registered: {}", id);
        id
    }

    /// Current view of a session. An expired session is destroyed once it
    /// has been reported. Someone else's session reads as missing.
    pub async fn view(&self, id: Uuid, owner: Option<TokenDigest>) -> Option<SessionView> {
        let view = {
            let sessions = self.sessions.read().await;
            let active = sessions.get(&id).filter(|active| active.owner == owner)?;
            let state = active.page.session()?;
            let redirect = active.forced_navigation.borrow().clone();
            SessionView::new(id, state, redirect)
        };

        if view.status == SessionStatus::Expired {
            self.sessions.write().await.remove(&id);
            tracing::debug!("🗂️ Expired session destroyed: {}", id);
        }

        Some(view)
    }

    /// Unmounts and forgets a session owned by `owner`.
    pub async fn remove(&self, id: Uuid, owner: Option<TokenDigest>) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id).is_none_or(|active| active.owner != owner) {
            return false;
        }
        let removed = sessions.remove(&id);
        drop(sessions);

        match removed {
            Some(mut active) => {
                active.page.unmount();
                tracing::debug!("🗂️ Session removed: {}", id);
                true
            }
            None => false,
        }
    }

    /// Drops finished sessions whose end lies more than `grace` in the past.
    pub async fn sweep(&self, grace: chrono::Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, active| match active.page.session() {
            Some(state) => !is_stale(&state, now, grace),
            None => false,
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn is_stale(state: &SessionState, now: DateTime<Utc>, grace: chrono::Duration) -> bool {
    if !state.status.is_finished() {
        return false;
    }
    let Some(started_at) = state.started_at else {
        return true;
    };
    let ends_at = started_at + chrono::Duration::seconds(state.content.duration_seconds as i64);
    ends_at + grace < now
}
