use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playadd_api::traits::SpotifyService;
use playadd_core::config::AppConfig;
use playadd_core::storage::SessionStore;
use playadd_runtime::SessionManager;

#[derive(Parser)]
#[command(name = "playadd", version, about = "Add watched videos to Spotify playlists")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect a Spotify account via the browser
    Login,
    /// Disconnect the Spotify account and forget all tokens
    Logout,
    /// Show the session state
    Status,
    /// Resolve a video title to a catalog track
    Resolve {
        /// Raw video title, platform suffix included
        title: String,
    },
    /// List playlists owned by the connected account
    Playlists,
    /// Add the most recently resolved track to a playlist
    Add {
        /// Target playlist id
        playlist_id: String,
    },
}

/// Commands that spend the access token refresh it first, since the stored
/// token may have expired since the last run.
fn needs_fresh_token(command: &Command) -> bool {
    matches!(
        command,
        Command::Status | Command::Resolve { .. } | Command::Playlists | Command::Add { .. }
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playadd=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let db_path = AppConfig::ensure_db_path()?;
    let store = SessionStore::open(&db_path)?;
    let service = SpotifyService::new(config.backend.url.clone());
    let manager = SessionManager::new(service, store, &config)?;

    if needs_fresh_token(&cli.command) && manager.is_logged_in().await {
        manager.refresh_tick().await;
    }

    match cli.command {
        Command::Login => {
            if manager.login().await {
                println!("Logged in.");
            } else {
                return Err("login failed".into());
            }
        }
        Command::Logout => {
            manager.logout().await;
            println!("Logged out.");
        }
        Command::Status => {
            if manager.is_logged_in().await {
                match manager.profile().await {
                    Ok(profile) => match profile.email {
                        Some(email) => println!("Logged in as {email}."),
                        None => println!("Logged in."),
                    },
                    Err(e) => {
                        tracing::debug!("profile lookup failed: {e}");
                        println!("Logged in (profile unavailable).");
                    }
                }
            } else {
                println!("Not logged in.");
            }
            match manager.current_track().await {
                Some(track) => println!("Cached track: {} by {}", track.name, track.artist),
                None => println!("No cached track."),
            }
        }
        Command::Resolve { title } => match manager.resolve_title(&title).await? {
            Some(track) => {
                println!("{} by {}", track.name, track.artist);
                println!("{}", track.url);
            }
            None => println!("No match found."),
        },
        Command::Playlists => {
            let playlists = manager.playlists().await?;
            if playlists.is_empty() {
                println!("No owned playlists.");
            }
            for playlist in playlists {
                println!("{}  {}", playlist.id, playlist.name);
            }
        }
        Command::Add { playlist_id } => {
            if manager.add_current_to_playlist(&playlist_id).await? {
                println!("Track added.");
            } else {
                println!("No track to add. Resolve a title first.");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_consuming_commands_refresh_first() {
        assert!(needs_fresh_token(&Command::Status));
        assert!(needs_fresh_token(&Command::Resolve {
            title: "Song - YouTube".into()
        }));
        assert!(needs_fresh_token(&Command::Playlists));
        assert!(needs_fresh_token(&Command::Add {
            playlist_id: "playlist-1".into()
        }));

        assert!(!needs_fresh_token(&Command::Login));
        assert!(!needs_fresh_token(&Command::Logout));
    }
}
