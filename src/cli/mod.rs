//! Command implementations behind the `reminiscence` binary.
//!
//! Each command loads [`Settings`] from the environment, opens the database
//! and reports to the terminal through the colored output macros. Fatal
//! problems end the process via [`error!`](crate::error!).

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tabled::Table;

use crate::{
    api::AppState,
    config::Settings,
    db::{Database, UpsertArtist},
    error, info,
    management::{SyncOptions, SyncService, TokenManager},
    server,
    spotify::{self, SpotifyClient},
    success, utils, warning,
};

fn load_settings() -> Settings {
    match Settings::from_env() {
        Ok(s) => s,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    }
}

async fn open_database(settings: &Settings) -> Database {
    match Database::connect(&settings.database_url).await {
        Ok(db) => db,
        Err(e) => error!("Cannot open database {}. Err: {}", settings.database_url, e),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Runs the HTTP API until the process is stopped.
pub async fn serve(addr: Option<String>) {
    let mut settings = load_settings();
    if let Some(addr) = addr {
        settings.server_addr = addr;
    }

    let db = open_database(&settings).await;
    let state = AppState::new(db, settings.spotify.clone());

    info!("Serving on http://{}/api", settings.server_addr);
    if let Err(e) = server::start_api_server(state, &settings.server_addr).await {
        error!("Server stopped. Err: {}", e);
    }
}

/// Creates or updates the database schema.
pub async fn migrate() {
    let settings = load_settings();
    // connecting runs the migrations
    open_database(&settings).await;
    success!("Database ready at {}", settings.database_url);
}

pub async fn sync(user_id: i64, options: SyncOptions) {
    let settings = load_settings();
    let db = open_database(&settings).await;

    match db.get_user(user_id).await {
        Ok(Some(user)) => info!("Syncing library of {}", user.username),
        Ok(None) => error!("User {} does not exist", user_id),
        Err(e) => error!("Cannot load user {}. Err: {}", user_id, e),
    }

    let http = Client::new();
    let mut token_mgr = match TokenManager::for_user(&db, &settings.spotify, &http, user_id).await {
        Ok(t) => t,
        Err(e) => error!("Cannot use Spotify account of user {}. Err: {}", user_id, e),
    };
    let client = match token_mgr.client().await {
        Ok(c) => c,
        Err(e) => error!("Cannot refresh Spotify token. Err: {}", e),
    };

    let pb = spinner("Syncing with Spotify...");
    let result = SyncService::new(db, client, user_id).full_sync(&options).await;
    pb.finish_and_clear();

    match result {
        Ok(results) => {
            if results.total() == 0 {
                warning!("Nothing was synced.");
            }
            println!("{}", Table::new([results]));
            success!("Sync completed!");
        }
        Err(e) => error!("Sync failed. Err: {}", e),
    }
}

/// Looks up an artist locally, falling back to a Spotify search with an
/// app-only token. The first remote match is stored.
pub async fn search_artist(name: &str) {
    let settings = load_settings();
    let db = open_database(&settings).await;

    match db.find_artist_by_name(name).await {
        Ok(Some(artist)) => {
            success!("Found {} in the catalog (id {})", artist.name, artist.artist_id);
            return;
        }
        Ok(None) => info!("{} is not in the catalog yet, asking Spotify...", name),
        Err(e) => error!("Cannot search the catalog. Err: {}", e),
    }

    let http = Client::new();
    let token = match spotify::auth::client_credentials_token(&http, &settings.spotify).await {
        Ok(t) => t,
        Err(e) => error!("Cannot obtain an app token. Err: {}", e),
    };
    let client = SpotifyClient::with_http(http, &settings.spotify.api_url, token.access_token);

    let pb = spinner("Searching Spotify...");
    let response = client.search(name, "artist", 1).await;
    pb.finish_and_clear();

    let found = match response {
        Ok(r) => r.artists.and_then(|page| page.items.into_iter().next()),
        Err(e) => error!("Spotify search failed. Err: {}", e),
    };
    let Some(artist) = found else {
        warning!("No artist named {} on Spotify", name);
        return;
    };

    let record = UpsertArtist {
        spotify_id: artist.id.clone(),
        name: artist.name.clone(),
        spotify_url: artist.external_urls.spotify.clone(),
        image_url: utils::first_image_url(&artist.images),
        popularity: artist.popularity.map(i64::from),
        followers: artist.followers.as_ref().map(|f| f.total as i64),
    };
    let artist_id = match db.upsert_artist(&record).await {
        Ok(id) => id,
        Err(e) => error!("Cannot save artist. Err: {}", e),
    };
    for genre in &artist.genres {
        if let Err(e) = db.upsert_genre(genre).await {
            warning!("Cannot save genre {}. Err: {}", genre, e);
        }
    }

    success!("Saved {} (id {})", artist.name, artist_id);
}
