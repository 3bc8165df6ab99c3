use serde::Serialize;
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::credential::{Credential, SyllabusSelection};
use crate::services::credentials::CredentialStore;

/// A dashboard sidebar entry.
///
/// Syllabus-scoped entries are rendered disabled, never hidden, until a
/// syllabus is chosen so the layout does not jump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarLink {
    pub label: &'static str,
    pub href: &'static str,
    pub enabled: bool,
}

const SIDEBAR: [(&str, &str, bool); 6] = [
    ("Dashboard", "/dashboard", false),
    ("Choose Syllabus", "/dashboard/syllabus", false),
    ("Exams", "/dashboard/exams", true),
    ("Quizzes", "/dashboard/quizzes", true),
    ("Learn & Practice", "/dashboard/learn-and-practice", true),
    ("Subscription", "/pricing", false),
];

/// Whether a syllabus has been chosen in this tab.
///
/// Changed by exactly one action, `select`. Subscribers are notified on
/// every effective change so gated links can be re-evaluated.
pub struct SyllabusSelectionState {
    tx: watch::Sender<Option<SyllabusSelection>>,
}

impl SyllabusSelectionState {
    pub fn new(initial: Option<SyllabusSelection>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Seeds the state from the persisted credential.
    pub fn from_credential(credential: &Credential) -> Self {
        Self::new(credential.selection())
    }

    /// Chooses a syllabus and persists it to `store`.
    ///
    /// Both `id` and `name` must be non-blank. Returns `true` when this call
    /// flipped the state from disabled to enabled.
    pub fn select(&self, store: &dyn CredentialStore, id: &str, name: &str) -> Result<bool> {
        let selection = SyllabusSelection::new(id, name).ok_or_else(|| {
            AppError::Validation("Syllabus id and name cannot be blank".to_string())
        })?;

        let was_enabled = self.is_enabled();
        store.set_category(&selection.category_id, &selection.category_name);
        tracing::info!("📚 Syllabus selected: {}", selection.category_name);

        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&selection) {
                return false;
            }
            *current = Some(selection);
            true
        });

        Ok(!was_enabled)
    }

    /// True only when both id and name are present.
    pub fn is_enabled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn selection(&self) -> Option<SyllabusSelection> {
        self.tx.borrow().clone()
    }

    /// Receiver notified whenever the selection changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<SyllabusSelection>> {
        self.tx.subscribe()
    }

    /// Sidebar links with syllabus-scoped entries enabled per `is_enabled`.
    pub fn sidebar(&self) -> Vec<SidebarLink> {
        let enabled = self.is_enabled();
        SIDEBAR
            .iter()
            .map(|&(label, href, scoped)| SidebarLink {
                label,
                href,
                enabled: !scoped || enabled,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::MemoryCredentialStore;

    #[test]
    fn disabled_until_both_fields_present() {
        let half = Credential {
            category_id: Some("3".into()),
            ..Default::default()
        };
        assert!(!SyllabusSelectionState::from_credential(&half).is_enabled());

        let half = Credential {
            category_name: Some("Physics".into()),
            ..Default::default()
        };
        assert!(!SyllabusSelectionState::from_credential(&half).is_enabled());

        let full = Credential {
            category_id: Some("3".into()),
            category_name: Some("Physics".into()),
            ..Default::default()
        };
        assert!(SyllabusSelectionState::from_credential(&full).is_enabled());
    }

    #[test]
    fn select_flips_exactly_once() {
        let state = SyllabusSelectionState::new(None);
        let store = MemoryCredentialStore::new();

        assert!(state.select(&store, "3", "Physics").unwrap());
        assert!(state.is_enabled());
        assert!(!state.select(&store, "3", "Physics").unwrap());
        assert!(!state.select(&store, "4", "Chemistry").unwrap());

        let stored = store.get().selection().unwrap();
        assert_eq!(stored.category_id, "4");
    }

    #[test]
    fn blank_selection_is_rejected_and_not_persisted() {
        let state = SyllabusSelectionState::new(None);
        let store = MemoryCredentialStore::new();

        assert!(state.select(&store, "", "Physics").is_err());
        assert!(state.select(&store, "3", " ").is_err());
        assert!(!state.is_enabled());
        assert!(store.get().is_empty());
    }

    #[test]
    fn subscribers_see_changes_only() {
        let state = SyllabusSelectionState::new(None);
        let store = MemoryCredentialStore::new();
        let mut rx = state.subscribe();

        state.select(&store, "3", "Physics").unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        state.select(&store, "3", "Physics").unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn sidebar_disables_instead_of_hiding() {
        let state = SyllabusSelectionState::new(None);
        let links = state.sidebar();
        assert_eq!(links.len(), 6);

        let exams = links.iter().find(|l| l.href == "/dashboard/exams").unwrap();
        assert!(!exams.enabled);
        let dashboard = links.iter().find(|l| l.href == "/dashboard").unwrap();
        assert!(dashboard.enabled);

        state
            .select(&MemoryCredentialStore::new(), "3", "Physics")
            .unwrap();
        assert!(state.sidebar().iter().all(|l| l.enabled));
    }
}
