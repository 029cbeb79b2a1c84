use reqwest::Client;

use playadd_core::models::ResolvedTrack;

use super::error::SpotifyError;
use super::types::{Playlist, PlaylistPage, SearchResponse, UserProfile};

const API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify Web API client. Tokens are passed per call because the session
/// layer owns them and rotates them underneath us.
pub struct SpotifyClient {
    http: Client,
}

impl SpotifyClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    fn bearer(access_token: &str) -> String {
        format!("Bearer {access_token}")
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(SpotifyError::Api {
                status,
                message: body,
            })
        }
    }

    /// Search for a track and return the single best match, or `None` when
    /// the catalog has nothing for the query.
    pub async fn search_track(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<ResolvedTrack>, SpotifyError> {
        let resp = self
            .http
            .get(format!("{API_BASE}/search"))
            .header("Authorization", Self::bearer(access_token))
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        Ok(body
            .tracks
            .items
            .into_iter()
            .next()
            .map(|t| t.into_resolved()))
    }

    /// Insert a track at the top of a playlist.
    pub async fn add_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        track_uri: &str,
    ) -> Result<(), SpotifyError> {
        let resp = self
            .http
            .post(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
            .header("Authorization", Self::bearer(access_token))
            .query(&[("uris", track_uri), ("position", "0")])
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }

    /// Fetch the authenticated user's profile.
    pub async fn profile(&self, access_token: &str) -> Result<UserProfile, SpotifyError> {
        let resp = self
            .http
            .get(format!("{API_BASE}/me"))
            .header("Authorization", Self::bearer(access_token))
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }

    /// List the playlists the authenticated user owns. Followed playlists
    /// come back from the same endpoint, so filter on the owner URI.
    pub async fn user_playlists(
        &self,
        access_token: &str,
    ) -> Result<Vec<Playlist>, SpotifyError> {
        let me = self.profile(access_token).await?;

        let resp = self
            .http
            .get(format!("{API_BASE}/me/playlists"))
            .header("Authorization", Self::bearer(access_token))
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let page: PlaylistPage = resp
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        Ok(page
            .items
            .into_iter()
            .filter(|p| p.owner.uri == me.uri)
            .collect())
    }
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new()
    }
}
