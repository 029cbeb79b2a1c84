use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::TabState;

/// Which popup a tab should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupPage {
    /// Prompt to connect a Spotify account.
    Login,
    /// The resolved-track panel with the playlist picker.
    Track,
    /// Neutral placeholder while nothing is being watched.
    Holder,
}

/// Pure assignment rule, evaluated in precedence order: the login prompt
/// always wins, then the viewing state decides between track and holder.
pub fn assign(is_logged_in: bool, tab: &TabState) -> PopupPage {
    if !is_logged_in {
        PopupPage::Login
    } else if tab.is_watching_video {
        PopupPage::Track
    } else {
        PopupPage::Holder
    }
}

/// Viewing state for every open tab, keyed by the browser's tab id.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<u64, TabState>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a tab, or the empty state if it has not been seen yet.
    pub fn get(&self, tab_id: u64) -> TabState {
        self.tabs.get(&tab_id).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, tab_id: u64, state: TabState) {
        self.tabs.insert(tab_id, state);
    }

    pub fn remove(&mut self, tab_id: u64) {
        self.tabs.remove(&tab_id);
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Popup assignment for every open tab. A login change re-applies to all
    /// tabs, not just the active one.
    pub fn assignments(&self, is_logged_in: bool) -> Vec<(u64, PopupPage)> {
        self.tabs
            .iter()
            .map(|(&id, state)| (id, assign(is_logged_in, state)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watching() -> TabState {
        TabState {
            is_watching_video: true,
            video_title: Some("Song - YouTube".into()),
        }
    }

    #[test]
    fn test_logged_out_always_login_page() {
        assert_eq!(assign(false, &watching()), PopupPage::Login);
        assert_eq!(assign(false, &TabState::default()), PopupPage::Login);
    }

    #[test]
    fn test_logged_in_watching_is_track_page() {
        assert_eq!(assign(true, &watching()), PopupPage::Track);
    }

    #[test]
    fn test_logged_in_not_watching_is_holder_page() {
        assert_eq!(assign(true, &TabState::default()), PopupPage::Holder);
    }

    #[test]
    fn test_assignments_cover_all_tabs() {
        let mut registry = TabRegistry::new();
        registry.insert(1, watching());
        registry.insert(2, TabState::default());

        let mut logged_in = registry.assignments(true);
        logged_in.sort_by_key(|(id, _)| *id);
        assert_eq!(logged_in, vec![(1, PopupPage::Track), (2, PopupPage::Holder)]);

        // Logging out flips every tab, not just the watching one.
        let logged_out = registry.assignments(false);
        assert!(logged_out.iter().all(|(_, page)| *page == PopupPage::Login));
    }

    #[test]
    fn test_removed_tab_drops_assignment() {
        let mut registry = TabRegistry::new();
        registry.insert(1, watching());
        registry.remove(1);
        assert!(registry.assignments(true).is_empty());
        assert!(registry.is_empty());
    }
}
