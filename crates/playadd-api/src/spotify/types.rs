use serde::Deserialize;

use playadd_core::models::ResolvedTrack;

/// Tokens handed back by the OAuth proxy, either as redirect query
/// parameters after the consent screen or as the refresh response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    /// The proxy occasionally rotates the refresh token; absent means keep
    /// the one already stored.
    pub refresh_token: Option<String>,
}

// ── Search ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub struct TrackPage {
    pub items: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    pub album: AlbumObject,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
pub struct ImageObject {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl TrackObject {
    /// Flatten the API shape into the display fields the popup needs.
    /// Multiple artists are joined with ", ".
    pub fn into_resolved(self) -> ResolvedTrack {
        let artist = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        ResolvedTrack {
            name: self.name,
            artist,
            cover_url: self.album.images.first().map(|i| i.url.clone()),
            url: self.external_urls.spotify.unwrap_or_default(),
            uri: self.uri,
        }
    }
}

// ── Profile & playlists ─────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub uri: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner: PlaylistOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistOwner {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistPage {
    pub items: Vec<Playlist>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "tracks": {
            "items": [{
                "name": "Song",
                "uri": "spotify:track:abc",
                "artists": [{"name": "Artist"}, {"name": "Other"}],
                "album": {"images": [{"url": "https://i.scdn.co/image/abc"}]},
                "external_urls": {"spotify": "https://open.spotify.com/track/abc"}
            }]
        }
    }"#;

    #[test]
    fn test_search_response_maps_to_resolved_track() {
        let body: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let track = body.tracks.items.into_iter().next().unwrap().into_resolved();

        assert_eq!(track.name, "Song");
        assert_eq!(track.artist, "Artist, Other");
        assert_eq!(track.cover_url.as_deref(), Some("https://i.scdn.co/image/abc"));
        assert_eq!(track.url, "https://open.spotify.com/track/abc");
        assert_eq!(track.uri, "spotify:track:abc");
    }

    #[test]
    fn test_empty_search_results() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"tracks": {"items": []}}"#).unwrap();
        assert!(body.tracks.items.is_empty());
    }

    #[test]
    fn test_track_without_cover_art() {
        let json = r#"{
            "name": "Song",
            "uri": "spotify:track:abc",
            "artists": [{"name": "Artist"}],
            "album": {"images": []},
            "external_urls": {}
        }"#;
        let track: TrackObject = serde_json::from_str(json).unwrap();
        let resolved = track.into_resolved();
        assert_eq!(resolved.cover_url, None);
        assert_eq!(resolved.url, "");
    }

    #[test]
    fn test_refresh_body_without_rotated_token() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "new-access"}"#).unwrap();
        assert_eq!(pair.access_token, "new-access");
        assert_eq!(pair.refresh_token, None);
    }
}
