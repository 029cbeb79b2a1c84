use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PlayaddError;
use crate::models::{ResolvedTrack, Session};

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

/// Token row for the one music service we talk to.
const SERVICE: &str = "spotify";

const KEY_LOGGED_IN: &str = "is_logged_in";
const KEY_LAST_TITLE: &str = "last_video_title";
const KEY_CACHED_TRACK: &str = "cached_track";

/// SQLite-backed persistence for the session and small UI state.
///
/// Writes are plain overwrites; last write wins, matching the low write
/// frequency of the token lifecycle.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, PlayaddError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, PlayaddError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Session ─────────────────────────────────────────────────

    /// Reassemble the persisted session (empty when nothing is stored).
    pub fn load_session(&self) -> Result<Session, PlayaddError> {
        let tokens: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT access_token, refresh_token FROM auth_tokens WHERE service = ?1",
                params![SERVICE],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let is_logged_in = self.get_state(KEY_LOGGED_IN)?.as_deref() == Some("true");

        let (access_token, refresh_token) = match tokens {
            Some((access, refresh)) => (Some(access), refresh),
            None => (None, None),
        };

        Ok(Session {
            access_token,
            refresh_token,
            is_logged_in,
        })
    }

    /// Store both tokens, overwriting any previous pair.
    pub fn save_tokens(&self, access: &str, refresh: Option<&str>) -> Result<(), PlayaddError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_tokens (service, access_token, refresh_token, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![SERVICE, access, refresh, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Erase both tokens.
    pub fn clear_tokens(&self) -> Result<(), PlayaddError> {
        self.conn
            .execute("DELETE FROM auth_tokens WHERE service = ?1", params![SERVICE])?;
        Ok(())
    }

    pub fn set_logged_in(&self, logged_in: bool) -> Result<(), PlayaddError> {
        self.set_state(KEY_LOGGED_IN, if logged_in { "true" } else { "false" })
    }

    // ── Last-seen video title ───────────────────────────────────

    pub fn set_last_video_title(&self, title: &str) -> Result<(), PlayaddError> {
        self.set_state(KEY_LAST_TITLE, title)
    }

    pub fn last_video_title(&self) -> Result<Option<String>, PlayaddError> {
        self.get_state(KEY_LAST_TITLE)
    }

    // ── Cached track ────────────────────────────────────────────

    pub fn save_cached_track(&self, track: &ResolvedTrack) -> Result<(), PlayaddError> {
        let json =
            serde_json::to_string(track).map_err(|e| PlayaddError::State(e.to_string()))?;
        self.set_state(KEY_CACHED_TRACK, &json)
    }

    /// The cached track, or `None` when the slot is empty or unreadable.
    pub fn cached_track(&self) -> Result<Option<ResolvedTrack>, PlayaddError> {
        Ok(self
            .get_state(KEY_CACHED_TRACK)?
            .and_then(|json| serde_json::from_str(&json).ok()))
    }

    pub fn clear_cached_track(&self) -> Result<(), PlayaddError> {
        self.conn.execute(
            "DELETE FROM app_state WHERE key = ?1",
            params![KEY_CACHED_TRACK],
        )?;
        Ok(())
    }

    // ── Key/value helpers ───────────────────────────────────────

    fn set_state(&self, key: &str, value: &str) -> Result<(), PlayaddError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<String>, PlayaddError> {
        self.conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), PlayaddError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> ResolvedTrack {
        ResolvedTrack {
            name: "Song".into(),
            artist: "Artist, Other".into(),
            cover_url: Some("https://i.scdn.co/image/abc".into()),
            url: "https://open.spotify.com/track/abc".into(),
            uri: "spotify:track:abc".into(),
        }
    }

    #[test]
    fn test_fresh_store_has_empty_session() {
        let store = SessionStore::open_memory().unwrap();
        let session = store.load_session().unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_token_roundtrip_and_overwrite() {
        let store = SessionStore::open_memory().unwrap();

        store.save_tokens("access-1", Some("refresh-1")).unwrap();
        store.set_logged_in(true).unwrap();

        let session = store.load_session().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("access-1"));
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
        assert!(session.is_logged_in);
        assert!(session.invariant_ok());

        // Overwrite, keeping the old refresh token.
        store.save_tokens("access-2", Some("refresh-1")).unwrap();
        let session = store.load_session().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("access-2"));
    }

    #[test]
    fn test_clear_tokens() {
        let store = SessionStore::open_memory().unwrap();
        store.save_tokens("a", Some("r")).unwrap();
        store.set_logged_in(true).unwrap();

        store.clear_tokens().unwrap();
        store.set_logged_in(false).unwrap();

        let session = store.load_session().unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_last_video_title() {
        let store = SessionStore::open_memory().unwrap();
        assert_eq!(store.last_video_title().unwrap(), None);

        store.set_last_video_title("Song - YouTube").unwrap();
        assert_eq!(
            store.last_video_title().unwrap().as_deref(),
            Some("Song - YouTube")
        );
    }

    #[test]
    fn test_cached_track_roundtrip_and_clear() {
        let store = SessionStore::open_memory().unwrap();
        assert_eq!(store.cached_track().unwrap(), None);

        store.save_cached_track(&track()).unwrap();
        assert_eq!(store.cached_track().unwrap(), Some(track()));

        store.clear_cached_track().unwrap();
        assert_eq!(store.cached_track().unwrap(), None);
    }

    #[test]
    fn test_disk_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playadd.db");

        {
            let store = SessionStore::open(&path).unwrap();
            store.save_tokens("access", Some("refresh")).unwrap();
            store.set_logged_in(true).unwrap();
        }

        let store = SessionStore::open(&path).unwrap();
        let session = store.load_session().unwrap();
        assert!(session.is_logged_in);
        assert!(session.tokens_present());
    }
}
