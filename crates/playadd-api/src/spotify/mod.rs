pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use client::SpotifyClient;
pub use error::SpotifyError;
