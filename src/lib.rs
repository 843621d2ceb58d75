//! Reminiscence Library
//!
//! Reminiscence links a Spotify account to a local music catalog. It mirrors
//! the user's playlists, songs, albums and artists into SQLite, exposes that
//! catalog over a JSON API and proxies playback control to Spotify.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for catalog, playlists, favorites, sync and player
//! - `cli` - Command implementations behind the `reminiscence` binary
//! - `config` - Environment and `.env` based settings
//! - `db` - SQLite persistence via sqlx
//! - `error` - Error types and the JSON error envelope
//! - `management` - Token refresh and the Spotify sync job
//! - `server` - Router assembly and the HTTP listener
//! - `spotify` - Spotify Web API and accounts client
//! - `types` - Spotify wire types
//! - `utils` - Small helpers shared across modules

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for command-level operations.
///
/// Used where several unrelated error types meet, mostly in the CLI and in
/// server start-up. Library code below that level returns typed errors from
/// [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Accepts the same arguments as `println!`.
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the CLI layer. Code after this macro does not
/// run.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
