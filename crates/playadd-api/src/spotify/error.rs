use thiserror::Error;

/// Errors from the Spotify client and the OAuth flow.
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("authorization cancelled")]
    Cancelled,

    #[error("missing or expired token")]
    TokenInvalid,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl SpotifyError {
    /// Whether a refresh failure with this error should end the session.
    ///
    /// A definitive 4xx means the refresh token is no longer honored;
    /// transport failures and server errors are retried on the next tick.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            SpotifyError::TokenInvalid => true,
            SpotifyError::Api { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_session_fatal() {
        assert!(SpotifyError::TokenInvalid.is_session_fatal());
        assert!(SpotifyError::Api {
            status: 401,
            message: "invalid refresh token".into()
        }
        .is_session_fatal());
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(!SpotifyError::Api {
            status: 503,
            message: "service unavailable".into()
        }
        .is_session_fatal());
        assert!(!SpotifyError::Cancelled.is_session_fatal());
        assert!(!SpotifyError::Parse("bad json".into()).is_session_fatal());
    }
}
