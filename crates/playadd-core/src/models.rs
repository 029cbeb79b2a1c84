use serde::{Deserialize, Serialize};

/// Spotify credentials plus the login flag, as persisted between runs.
///
/// Owned exclusively by the session manager; every other component works
/// from a cloned snapshot and never mutates the session directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_logged_in: bool,
}

impl Session {
    /// Both tokens are present and non-empty.
    pub fn tokens_present(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// The login flag may only be set while both tokens are present.
    /// A violated invariant must be healed by forcing a logout.
    pub fn invariant_ok(&self) -> bool {
        !self.is_logged_in || self.tokens_present()
    }

    /// Drop both tokens and the login flag.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.is_logged_in = false;
    }
}

/// What a single browser tab is currently showing.
///
/// Derived from tab navigation/title events; never persisted across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabState {
    pub is_watching_video: bool,
    pub video_title: Option<String>,
}

/// The most recently resolved catalog hit (single slot, invalidated when
/// the watched title changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub name: String,
    /// All artist names joined with ", ".
    pub artist: String,
    pub cover_url: Option<String>,
    pub url: String,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_holds_invariant() {
        let session = Session::default();
        assert!(!session.is_logged_in);
        assert!(session.invariant_ok());
    }

    #[test]
    fn test_logged_in_without_tokens_violates_invariant() {
        let session = Session {
            access_token: None,
            refresh_token: None,
            is_logged_in: true,
        };
        assert!(!session.invariant_ok());

        // Empty strings count as missing too.
        let session = Session {
            access_token: Some(String::new()),
            refresh_token: Some("r".into()),
            is_logged_in: true,
        };
        assert!(!session.invariant_ok());
    }

    #[test]
    fn test_logged_in_with_tokens_holds_invariant() {
        let session = Session {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            is_logged_in: true,
        };
        assert!(session.invariant_ok());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = Session {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            is_logged_in: true,
        };
        session.clear();
        assert_eq!(session, Session::default());
        assert!(session.invariant_ok());
    }
}
