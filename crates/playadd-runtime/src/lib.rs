//! Session lifecycle for the watcher: login, scheduled token refresh,
//! per-tab popup assignment, and the title-to-track resolution cache.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use playadd_api::spotify::types::{Playlist, TokenPair, UserProfile};
use playadd_api::spotify::SpotifyError;
use playadd_api::traits::MusicService;
use playadd_core::config::AppConfig;
use playadd_core::detect::VideoDetector;
use playadd_core::error::PlayaddError;
use playadd_core::models::{ResolvedTrack, Session};
use playadd_core::popup::{self, PopupPage, TabRegistry};
use playadd_core::query::clean_title;
use playadd_core::storage::SessionStore;

mod router;
mod scheduler;

pub use router::{Request, Response};
pub use scheduler::RefreshScheduler;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("storage error: {0}")]
    Storage(#[from] PlayaddError),
    #[error("service error: {0}")]
    Service(#[from] SpotifyError),
    #[error("not logged in")]
    NotLoggedIn,
}

/// Owns the session state and drives it from four inputs: the interactive
/// login flow, the periodic refresh tick, tab events, and control messages.
///
/// Invariant: `is_logged_in` implies both tokens are present. Any state
/// found violating it is healed by forcing a logout.
pub struct SessionManager<S: MusicService + 'static> {
    service: S,
    store: Mutex<SessionStore>,
    session: RwLock<Session>,
    tabs: RwLock<TabRegistry>,
    detector: VideoDetector,
    /// Raw title of the most recently observed watched video.
    last_title: RwLock<Option<String>>,
    /// Single-slot cache of the most recent resolution result.
    track_cache: RwLock<Option<ResolvedTrack>>,
    scheduler: Mutex<RefreshScheduler>,
    refresh_period: Duration,
    /// Handle to self for spawning the refresh task.
    weak_self: Weak<SessionManager<S>>,
}

impl<S: MusicService + 'static> SessionManager<S> {
    pub fn new(
        service: S,
        store: SessionStore,
        config: &AppConfig,
    ) -> Result<Arc<Self>, RuntimeError> {
        let mut session = store.load_session()?;
        if !session.invariant_ok() {
            tracing::warn!("logged-in flag set without stored tokens, forcing logout");
            session.clear();
            store.clear_tokens()?;
            store.set_logged_in(false)?;
        }

        let last_title = store.last_video_title()?;
        let track_cache = store.cached_track()?;

        let detector = match VideoDetector::with_pattern(&config.general.video_url_pattern) {
            Ok(detector) => detector,
            Err(e) => {
                tracing::warn!("invalid video URL pattern in config, using default: {e}");
                VideoDetector::new()
            }
        };

        // A zero period would panic when the interval is armed.
        let interval_minutes = match config.general.refresh_interval_minutes {
            0 => {
                tracing::warn!("refresh interval must be at least one minute, using 1");
                1
            }
            minutes => minutes,
        };

        Ok(Arc::new_cyclic(|weak_self| Self {
            service,
            store: Mutex::new(store),
            session: RwLock::new(session),
            tabs: RwLock::new(TabRegistry::new()),
            detector,
            last_title: RwLock::new(last_title),
            track_cache: RwLock::new(track_cache),
            scheduler: Mutex::new(RefreshScheduler::new()),
            refresh_period: Duration::from_secs(interval_minutes * 60),
            weak_self: weak_self.clone(),
        }))
    }

    /// Resume a persisted session: if logged in, refresh immediately and
    /// then keep refreshing on the configured period.
    pub async fn start(&self) {
        if self.session.read().await.is_logged_in {
            self.arm_scheduler(true).await;
        }
    }

    // ── Login / logout ──────────────────────────────────────────

    /// Run the interactive authorization flow. On success the tokens are
    /// persisted, every tab's popup is reassigned, and the refresh
    /// scheduler is armed for one period from now.
    pub async fn login(&self) -> bool {
        let pair = match self.service.authorize().await {
            Ok(pair) => pair,
            Err(SpotifyError::Cancelled) => {
                tracing::debug!("authorization cancelled");
                return false;
            }
            Err(e) => {
                tracing::warn!("authorization failed: {e}");
                return false;
            }
        };

        let Some(refresh_token) = pair.refresh_token else {
            tracing::warn!("authorization returned no refresh token");
            return false;
        };

        {
            let store = self.store.lock().await;
            if let Err(e) = store
                .save_tokens(&pair.access_token, Some(&refresh_token))
                .and_then(|()| store.set_logged_in(true))
            {
                tracing::warn!("failed to persist session: {e}");
                return false;
            }
        }

        {
            let mut session = self.session.write().await;
            session.access_token = Some(pair.access_token);
            session.refresh_token = Some(refresh_token);
            session.is_logged_in = true;
        }

        tracing::info!("logged in");
        self.reapply_popups().await;
        self.arm_scheduler(false).await;
        true
    }

    /// End the session: clear tokens in memory and on disk, reassign every
    /// tab's popup, and stop the refresh scheduler.
    pub async fn logout(&self) {
        self.session.write().await.clear();

        {
            let store = self.store.lock().await;
            if let Err(e) = store.clear_tokens() {
                tracing::warn!("failed to clear stored tokens: {e}");
            }
            if let Err(e) = store.set_logged_in(false) {
                tracing::warn!("failed to persist logged-out state: {e}");
            }
        }

        self.reapply_popups().await;
        tracing::info!("logged out");

        // Last: when called from the refresh task this aborts the caller.
        self.scheduler.lock().await.cancel();
    }

    // ── Token refresh ───────────────────────────────────────────

    async fn arm_scheduler(&self, immediate: bool) {
        let Some(manager) = self.weak_self.upgrade() else {
            return;
        };
        let period = self.refresh_period;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            if !immediate {
                // An interval yields its first tick right away; swallow it
                // so a fresh login waits a full period.
                ticker.tick().await;
            }
            loop {
                ticker.tick().await;
                manager.refresh_tick().await;
            }
        });
        self.scheduler.lock().await.arm(handle);
    }

    /// One refresh attempt. Skipped entirely while logged out. A failure
    /// that means the refresh token is dead ends the session; anything
    /// else is left for the next tick.
    pub async fn refresh_tick(&self) {
        let refresh_token = {
            let session = self.session.read().await;
            if !session.is_logged_in {
                tracing::debug!("skipping refresh while logged out");
                return;
            }
            session.refresh_token.clone()
        };

        let Some(refresh_token) = refresh_token else {
            tracing::warn!("logged in without a refresh token, ending session");
            self.logout().await;
            return;
        };

        match self.service.refresh(&refresh_token).await {
            Ok(pair) => self.apply_refresh(pair).await,
            Err(e) if e.is_session_fatal() => {
                tracing::warn!("refresh token rejected, ending session: {e}");
                self.logout().await;
            }
            Err(e) => tracing::warn!("token refresh failed, will retry: {e}"),
        }
    }

    /// Fold a refresh response into the session. The refresh token is only
    /// replaced when the response rotated it.
    ///
    /// The logged-in check and the disk write happen under one store lock,
    /// so a logout completing in between cannot have its cleared tokens
    /// re-written by a late response.
    async fn apply_refresh(&self, pair: TokenPair) {
        let store = self.store.lock().await;

        let refresh_token = {
            let mut session = self.session.write().await;
            if !session.is_logged_in {
                // The user logged out while the request was in flight.
                tracing::debug!("discarding refresh result after logout");
                return;
            }
            session.access_token = Some(pair.access_token.clone());
            if let Some(rotated) = pair.refresh_token {
                session.refresh_token = Some(rotated);
            }
            session.refresh_token.clone()
        };

        if let Err(e) = store.save_tokens(&pair.access_token, refresh_token.as_deref()) {
            tracing::warn!("failed to persist refreshed tokens: {e}");
        }
        tracing::debug!("access token refreshed");
    }

    // ── Tabs & popups ───────────────────────────────────────────

    /// Feed a tab update (URL and/or title change) through the detector and
    /// return the popup the tab should now present.
    pub async fn tab_updated(
        &self,
        tab_id: u64,
        url: Option<&str>,
        title: Option<&str>,
    ) -> PopupPage {
        let next = {
            let mut tabs = self.tabs.write().await;
            let prev = tabs.get(tab_id);
            let next = self.detector.observe(&prev, url, title);
            tabs.insert(tab_id, next.clone());
            next
        };

        if next.is_watching_video {
            if let Some(title) = &next.video_title {
                *self.last_title.write().await = Some(title.clone());
            }
        }

        let is_logged_in = self.session.read().await.is_logged_in;
        popup::assign(is_logged_in, &next)
    }

    pub async fn tab_removed(&self, tab_id: u64) {
        self.tabs.write().await.remove(tab_id);
    }

    /// Popup assignment for every open tab under the current login state.
    pub async fn popup_assignments(&self) -> Vec<(u64, PopupPage)> {
        let is_logged_in = self.session.read().await.is_logged_in;
        self.tabs.read().await.assignments(is_logged_in)
    }

    async fn reapply_popups(&self) {
        for (tab_id, page) in self.popup_assignments().await {
            tracing::debug!(tab_id, ?page, "popup reassigned");
        }
    }

    // ── Track resolution ────────────────────────────────────────

    /// Resolve a raw video title to a catalog track. When the title matches
    /// the one resolved last time, the cached result is returned without
    /// touching the catalog, covering the common tab-switch case.
    pub async fn resolve_title(
        &self,
        raw_title: &str,
    ) -> Result<Option<ResolvedTrack>, RuntimeError> {
        let access_token = self.access_token().await?;

        let unchanged = {
            let store = self.store.lock().await;
            store.last_video_title()?.as_deref() == Some(raw_title)
        };
        if unchanged {
            return Ok(self.track_cache.read().await.clone());
        }

        let query = clean_title(raw_title);
        let found = self.service.search_track(&access_token, &query).await?;

        {
            let store = self.store.lock().await;
            store.set_last_video_title(raw_title)?;
            match &found {
                Some(track) => store.save_cached_track(track)?,
                None => store.clear_cached_track()?,
            }
        }
        *self.track_cache.write().await = found.clone();

        if found.is_none() {
            tracing::debug!(query, "no catalog match");
        }
        Ok(found)
    }

    /// Resolve whatever video is currently being watched, if any.
    pub async fn resolve_current_track(&self) -> Result<Option<ResolvedTrack>, RuntimeError> {
        let title = self.last_title.read().await.clone();
        match title {
            Some(title) => self.resolve_title(&title).await,
            None => Ok(None),
        }
    }

    /// Add the cached track to a playlist. Returns `false` when the cache
    /// slot is empty, which is not an error.
    pub async fn add_current_to_playlist(&self, playlist_id: &str) -> Result<bool, RuntimeError> {
        let access_token = self.access_token().await?;
        let track = self.track_cache.read().await.clone();
        let Some(track) = track else {
            return Ok(false);
        };

        self.service
            .add_to_playlist(&access_token, playlist_id, &track.uri)
            .await?;
        tracing::info!(track = %track.name, playlist_id, "track added to playlist");
        Ok(true)
    }

    // ── Account passthroughs ────────────────────────────────────

    pub async fn profile(&self) -> Result<UserProfile, RuntimeError> {
        let access_token = self.access_token().await?;
        Ok(self.service.profile(&access_token).await?)
    }

    pub async fn playlists(&self) -> Result<Vec<Playlist>, RuntimeError> {
        let access_token = self.access_token().await?;
        Ok(self.service.user_playlists(&access_token).await?)
    }

    // ── Control messages ────────────────────────────────────────

    /// Handle a control message from a frontend surface.
    pub async fn handle(&self, request: Request) -> Response {
        let success = match request {
            Request::Login => self.login().await,
            Request::Logout => {
                self.logout().await;
                true
            }
        };
        Response { success }
    }

    // ── Accessors ───────────────────────────────────────────────

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_logged_in
    }

    pub async fn current_track(&self) -> Option<ResolvedTrack> {
        self.track_cache.read().await.clone()
    }

    pub async fn scheduler_active(&self) -> bool {
        self.scheduler.lock().await.is_active()
    }

    async fn access_token(&self) -> Result<String, RuntimeError> {
        let session = self.session.read().await;
        match (&session.access_token, session.is_logged_in) {
            (Some(token), true) => Ok(token.clone()),
            _ => Err(RuntimeError::NotLoggedIn),
        }
    }
}
