//! Trait definition for music catalog services.
//!
//! The session layer talks to this interface so it can be exercised with a
//! mock service in tests, and so another catalog could slot in later.

use std::future::Future;

use playadd_core::models::ResolvedTrack;

use crate::spotify::types::{Playlist, TokenPair, UserProfile};
use crate::spotify::{auth, SpotifyClient, SpotifyError};

/// A music catalog with OAuth-proxied authentication and playlists.
pub trait MusicService: Send + Sync {
    /// Run the interactive authorization flow and return the token pair.
    fn authorize(&self) -> impl Future<Output = Result<TokenPair, SpotifyError>> + Send;

    /// Exchange a refresh token for a fresh access token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenPair, SpotifyError>> + Send;

    /// Search for a track; `None` means the catalog has no match.
    fn search_track(
        &self,
        access_token: &str,
        query: &str,
    ) -> impl Future<Output = Result<Option<ResolvedTrack>, SpotifyError>> + Send;

    /// Insert a track at the top of a playlist.
    fn add_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        track_uri: &str,
    ) -> impl Future<Output = Result<(), SpotifyError>> + Send;

    /// Fetch the authenticated user's profile.
    fn profile(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserProfile, SpotifyError>> + Send;

    /// List the playlists the authenticated user owns.
    fn user_playlists(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Playlist>, SpotifyError>> + Send;
}

/// The Spotify-backed implementation, delegating auth to the OAuth proxy.
pub struct SpotifyService {
    backend_url: String,
    client: SpotifyClient,
}

impl SpotifyService {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            client: SpotifyClient::new(),
        }
    }
}

impl MusicService for SpotifyService {
    async fn authorize(&self) -> Result<TokenPair, SpotifyError> {
        auth::authorize(&self.backend_url).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SpotifyError> {
        auth::refresh(&self.backend_url, refresh_token).await
    }

    async fn search_track(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<ResolvedTrack>, SpotifyError> {
        self.client.search_track(access_token, query).await
    }

    async fn add_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        track_uri: &str,
    ) -> Result<(), SpotifyError> {
        self.client
            .add_to_playlist(access_token, playlist_id, track_uri)
            .await
    }

    async fn profile(&self, access_token: &str) -> Result<UserProfile, SpotifyError> {
        self.client.profile(access_token).await
    }

    async fn user_playlists(&self, access_token: &str) -> Result<Vec<Playlist>, SpotifyError> {
        self.client.user_playlists(access_token).await
    }
}
