//! Command handlers and dispatch.
//!
//! Each CLI verb is classified as [`Action::Public`] or [`Action::Authed`];
//! the authentication requirement lives in that type, not in a wrapper.
//! Only the `Authed` arm resolves the persisted session into a [`User`], so
//! public commands can never observe login state by accident.
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Command;
use crate::session::{Session, SessionError};
use crate::storage::{Database, StorageError, User};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("not logged in; run `creel login <name>` or `creel register <name>` first")]
    AuthenticationRequired,

    #[error("unknown user `{0}`")]
    UnknownUser(String),

    #[error("user name `{0}` is already taken")]
    UserNameTaken(String),

    #[error("a feed is already registered at `{0}`")]
    FeedExists(String),

    #[error("no feed registered at `{0}`")]
    FeedNotFound(String),

    #[error("already following `{0}`")]
    AlreadyFollowing(String),

    #[error("not following `{0}`")]
    NotFollowing(String),

    #[error("invalid feed URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

// ============================================================================
// Dispatch
// ============================================================================

/// Shared state every handler works against
pub struct AppState {
    pub db: Database,
    pub client: reqwest::Client,
    pub session: Session,
    pub session_path: PathBuf,
}

/// A command with its capability requirement made explicit in the type
pub enum Action {
    Public(PublicCommand),
    Authed(AuthedCommand),
}

pub enum PublicCommand {
    Login { name: String },
    Register { name: String },
    Reset,
    Users,
    Agg { period: std::time::Duration },
    Feeds,
}

pub enum AuthedCommand {
    AddFeed { name: String, url: String },
    Follow { url: String },
    Following,
    Unfollow { url: String },
    Browse { limit: Option<i64> },
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Login { name } => Action::Public(PublicCommand::Login { name }),
            Command::Register { name } => Action::Public(PublicCommand::Register { name }),
            Command::Reset => Action::Public(PublicCommand::Reset),
            Command::Users => Action::Public(PublicCommand::Users),
            Command::Agg { period } => Action::Public(PublicCommand::Agg { period }),
            Command::Feeds => Action::Public(PublicCommand::Feeds),
            Command::AddFeed { name, url } => Action::Authed(AuthedCommand::AddFeed { name, url }),
            Command::Follow { url } => Action::Authed(AuthedCommand::Follow { url }),
            Command::Following => Action::Authed(AuthedCommand::Following),
            Command::Unfollow { url } => Action::Authed(AuthedCommand::Unfollow { url }),
            Command::Browse { limit } => Action::Authed(AuthedCommand::Browse { limit }),
        }
    }
}

/// Run one command to completion
pub async fn dispatch(state: &mut AppState, command: Command) -> Result<(), CommandError> {
    match Action::from(command) {
        Action::Public(cmd) => run_public(state, cmd).await,
        Action::Authed(cmd) => {
            let user = resolve_user(state).await?;
            run_authed(state, &user, cmd).await
        }
    }
}

/// Resolve the persisted session into a live user row.
///
/// # Errors
///
/// `AuthenticationRequired` when no one is logged in; `UnknownUser` when the
/// recorded name no longer exists (e.g. after a reset on another machine).
async fn resolve_user(state: &AppState) -> Result<User, CommandError> {
    let name = state
        .session
        .current_user_name
        .as_deref()
        .ok_or(CommandError::AuthenticationRequired)?;
    state
        .db
        .get_user_by_name(name)
        .await?
        .ok_or_else(|| CommandError::UnknownUser(name.to_string()))
}

async fn run_public(state: &mut AppState, command: PublicCommand) -> Result<(), CommandError> {
    match command {
        PublicCommand::Login { name } => {
            let user = state
                .db
                .get_user_by_name(&name)
                .await?
                .ok_or_else(|| CommandError::UnknownUser(name.clone()))?;
            state.session.set_user(&user.name, &state.session_path)?;
            println!("Logged in as {}", user.name);
            Ok(())
        }
        PublicCommand::Register { name } => {
            let user = state.db.create_user(&name).await.map_err(|e| match e {
                StorageError::UniqueViolation => CommandError::UserNameTaken(name.clone()),
                other => CommandError::Storage(other),
            })?;
            state.session.set_user(&user.name, &state.session_path)?;
            println!("Registered and logged in as {}", user.name);
            Ok(())
        }
        PublicCommand::Reset => {
            state.db.reset().await?;
            state.session.clear(&state.session_path)?;
            println!("Database reset.");
            Ok(())
        }
        PublicCommand::Users => {
            let current = state.session.current_user_name.as_deref();
            for user in state.db.list_users().await? {
                if Some(user.name.as_str()) == current {
                    println!("* {} (current)", user.name);
                } else {
                    println!("* {}", user.name);
                }
            }
            Ok(())
        }
        PublicCommand::Agg { period } => {
            crate::ingest::run(&state.db, &state.client, period, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
            Ok(())
        }
        PublicCommand::Feeds => {
            for feed in state.db.list_feeds_with_creators().await? {
                println!("Name: {}", feed.name);
                println!("URL: {}", feed.url);
                println!("Added by: {}", feed.creator);
                println!("---------------");
            }
            Ok(())
        }
    }
}

async fn run_authed(
    state: &AppState,
    user: &User,
    command: AuthedCommand,
) -> Result<(), CommandError> {
    match command {
        AuthedCommand::AddFeed { name, url } => {
            validate_feed_url(&url)?;
            let feed = state
                .db
                .create_feed(&name, &url, user.id)
                .await
                .map_err(|e| match e {
                    StorageError::UniqueViolation => CommandError::FeedExists(url.clone()),
                    other => CommandError::Storage(other),
                })?;
            // The creator follows their own feed implicitly
            state.db.create_follow(user.id, feed.id).await?;
            println!("Added feed `{}` ({}) and followed it", feed.name, feed.url);
            Ok(())
        }
        AuthedCommand::Follow { url } => {
            let feed = state
                .db
                .get_feed_by_url(&url)
                .await?
                .ok_or_else(|| CommandError::FeedNotFound(url.clone()))?;
            let follow = state
                .db
                .create_follow(user.id, feed.id)
                .await
                .map_err(|e| match e {
                    StorageError::UniqueViolation => CommandError::AlreadyFollowing(url.clone()),
                    other => CommandError::Storage(other),
                })?;
            println!("{} is now following `{}`", follow.user_name, follow.feed_name);
            Ok(())
        }
        AuthedCommand::Following => {
            let follows = state.db.follows_for_user(user.id).await?;
            if follows.is_empty() {
                println!("You are not following any feeds");
            } else {
                println!("Following:");
                for follow in follows {
                    println!("* {}", follow.feed_name);
                }
            }
            Ok(())
        }
        AuthedCommand::Unfollow { url } => {
            state
                .db
                .delete_follow(user.id, &url)
                .await
                .map_err(|e| match e {
                    StorageError::NotFound => CommandError::NotFollowing(url.clone()),
                    other => CommandError::Storage(other),
                })?;
            println!("Unfollowed `{}`", url);
            Ok(())
        }
        AuthedCommand::Browse { limit } => {
            let limit = limit.unwrap_or(2).max(0);
            let posts = state.db.posts_for_user(user.id, limit).await?;
            if posts.is_empty() {
                println!("No posts to show");
                return Ok(());
            }
            for post in posts {
                println!("Title: {}", post.title);
                println!("Link: {}", post.url);
                if let Some(description) = &post.description {
                    println!("Description: {}", truncate(description, 100));
                }
                if let Some(published) = post
                    .published_at
                    .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                {
                    println!("Published at: {}", published.format("%Y-%m-%d %H:%M UTC"));
                }
                println!("---------------");
            }
            Ok(())
        }
    }
}

/// Reject feed URLs that are not absolute http(s) before they reach the store
fn validate_feed_url(url: &str) -> Result<(), CommandError> {
    let parsed = url::Url::parse(url).map_err(|e| CommandError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CommandError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Command;

    async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            db: Database::open(":memory:").await.unwrap(),
            client: reqwest::Client::new(),
            session: Session::default(),
            session_path: dir.path().join("session.json"),
        };
        (state, dir)
    }

    #[tokio::test]
    async fn register_creates_user_and_logs_in() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();

        assert_eq!(state.session.current_user_name.as_deref(), Some("alice"));
        assert!(state.db.get_user_by_name("alice").await.unwrap().is_some());

        // The session survived to disk
        let reloaded = Session::load(&state.session_path).unwrap();
        assert_eq!(reloaded.current_user_name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn register_taken_name_fails() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();
        let err = dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::UserNameTaken(_)));
    }

    #[tokio::test]
    async fn login_requires_existing_user() {
        let (mut state, _dir) = test_state().await;
        let err = dispatch(&mut state, Command::Login { name: "ghost".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::UnknownUser(_)));
        assert_eq!(state.session.current_user_name, None);
    }

    #[tokio::test]
    async fn authed_command_without_session_is_rejected() {
        let (mut state, _dir) = test_state().await;
        let err = dispatch(&mut state, Command::Following).await.unwrap_err();
        assert!(matches!(err, CommandError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn stale_session_name_is_unknown_user() {
        let (mut state, _dir) = test_state().await;
        state.session.current_user_name = Some("gone".into());
        let err = dispatch(&mut state, Command::Following).await.unwrap_err();
        assert!(matches!(err, CommandError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn addfeed_creates_feed_and_auto_follows() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();
        dispatch(
            &mut state,
            Command::AddFeed {
                name: "Blog".into(),
                url: "https://example.com/rss".into(),
            },
        )
        .await
        .unwrap();

        let user = state.db.get_user_by_name("alice").await.unwrap().unwrap();
        let follows = state.db.follows_for_user(user.id).await.unwrap();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].feed_name, "Blog");
    }

    #[tokio::test]
    async fn addfeed_rejects_bad_urls() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();

        for url in ["not a url", "ftp://example.com/rss"] {
            let err = dispatch(
                &mut state,
                Command::AddFeed {
                    name: "Bad".into(),
                    url: url.into(),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CommandError::InvalidUrl { .. }), "{url}");
        }
    }

    #[tokio::test]
    async fn follow_and_unfollow_round_trip() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();
        dispatch(
            &mut state,
            Command::AddFeed {
                name: "Blog".into(),
                url: "https://example.com/rss".into(),
            },
        )
        .await
        .unwrap();

        // A second user can follow the same feed by URL
        dispatch(&mut state, Command::Register { name: "bob".into() })
            .await
            .unwrap();
        dispatch(&mut state, Command::Follow { url: "https://example.com/rss".into() })
            .await
            .unwrap();

        let err = dispatch(&mut state, Command::Follow { url: "https://example.com/rss".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::AlreadyFollowing(_)));

        dispatch(&mut state, Command::Unfollow { url: "https://example.com/rss".into() })
            .await
            .unwrap();
        let err = dispatch(&mut state, Command::Unfollow { url: "https://example.com/rss".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFollowing(_)));
    }

    #[tokio::test]
    async fn follow_unknown_feed_fails() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();
        let err = dispatch(&mut state, Command::Follow { url: "https://nowhere.example/rss".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::FeedNotFound(_)));
    }

    #[tokio::test]
    async fn reset_clears_session_too() {
        let (mut state, _dir) = test_state().await;
        dispatch(&mut state, Command::Register { name: "alice".into() })
            .await
            .unwrap();
        dispatch(&mut state, Command::Reset).await.unwrap();

        assert_eq!(state.session.current_user_name, None);
        assert!(state.db.list_users().await.unwrap().is_empty());
    }

    #[test]
    fn truncate_keeps_short_text_and_cuts_long() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(150);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
    }
}
