use std::io::{Read, Write};
use std::net::TcpListener;

use url::Url;

use super::error::SpotifyError;
use super::types::TokenPair;

/// Port the OAuth proxy redirects back to after the consent screen.
const REDIRECT_PORT: u16 = 43117;

/// Run the Authorization Code Flow via the OAuth proxy.
///
/// 1. Open the browser at the proxy's login route; the proxy forwards to the
///    Spotify consent page with client id, scopes, and redirect URI filled in,
///    and exchanges the code server-side so the secret never reaches us.
/// 2. Listen on localhost for the redirect carrying the exchanged tokens as
///    query parameters.
pub async fn authorize(backend_url: &str) -> Result<TokenPair, SpotifyError> {
    let login_url = format!("{backend_url}/api/spotify/login/");

    tracing::info!("Opening Spotify authorization URL in browser");
    open::that(&login_url)
        .map_err(|e| SpotifyError::Auth(format!("failed to open browser: {e}")))?;

    let redirect = listen_for_redirect()?;
    token_pair_from_redirect(&redirect)
}

/// Spawn a one-shot TCP listener, wait for the OAuth redirect, and return
/// the full redirect URL.
fn listen_for_redirect() -> Result<String, SpotifyError> {
    let listener = TcpListener::bind(("127.0.0.1", REDIRECT_PORT))
        .map_err(|e| SpotifyError::Auth(format!("failed to bind localhost:{REDIRECT_PORT}: {e}")))?;

    tracing::info!("Waiting for OAuth redirect on localhost:{REDIRECT_PORT}...");

    let (mut stream, _) = listener
        .accept()
        .map_err(|e| SpotifyError::Auth(format!("failed to accept connection: {e}")))?;

    let mut buf = [0u8; 4096];
    let n = stream
        .read(&mut buf)
        .map_err(|e| SpotifyError::Auth(format!("failed to read from stream: {e}")))?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| SpotifyError::Auth("malformed HTTP request from redirect".into()))?;

    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
                    <html><body><h2>Spotify connected!</h2>\
                    <p>You can close this tab and return to playadd.</p></body></html>";
    let _ = stream.write_all(response.as_bytes());

    Ok(format!("http://localhost{path}"))
}

/// Extract the token pair from the redirect URL's query parameters.
///
/// The proxy appends `error=...` instead of tokens when the user denied
/// consent; that (and a redirect with no tokens at all) maps to `Cancelled`,
/// leaving the session untouched.
pub fn token_pair_from_redirect(redirect_url: &str) -> Result<TokenPair, SpotifyError> {
    let parsed = Url::parse(redirect_url)
        .map_err(|e| SpotifyError::Parse(format!("failed to parse redirect URL: {e}")))?;

    let mut access_token = None;
    let mut refresh_token = None;
    let mut denied = false;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "access_token" => access_token = Some(value.to_string()),
            "refresh_token" => refresh_token = Some(value.to_string()),
            "error" => denied = true,
            _ => {}
        }
    }

    if denied {
        return Err(SpotifyError::Cancelled);
    }

    match access_token {
        Some(access_token) if !access_token.is_empty() => Ok(TokenPair {
            access_token,
            refresh_token,
        }),
        _ => Err(SpotifyError::Cancelled),
    }
}

/// Mint a fresh access token from the stored refresh token via the proxy.
pub async fn refresh(backend_url: &str, refresh_token: &str) -> Result<TokenPair, SpotifyError> {
    let http = reqwest::Client::new();
    let resp = http
        .get(format!("{backend_url}/api/spotify/refresh/"))
        .query(&[("refresh_token", refresh_token)])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(SpotifyError::Api {
            status,
            message: body,
        });
    }

    resp.json::<TokenPair>()
        .await
        .map_err(|e| SpotifyError::Parse(e.to_string()))
}
