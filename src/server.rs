use std::{net::SocketAddr, str::FromStr};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    Res,
    api::{self, AppState, catalog, favorites, history, player, playlists, search, spotify, sync},
};

/// All routes of the JSON API, nested under `/api`.
pub fn router(state: AppState) -> Router {
    let spotify_routes = Router::new()
        .route("/auth/url", get(spotify::auth_url))
        .route(
            "/auth/callback",
            get(spotify::callback_get).post(spotify::callback_post),
        )
        .route("/status", get(spotify::status))
        .route("/disconnect", axum::routing::delete(spotify::disconnect))
        .route("/dashboard", get(spotify::dashboard))
        .route("/artists/{spotify_id}", get(spotify::browse_artist))
        .route("/albums/{spotify_id}", get(spotify::browse_album))
        .route("/player/current", get(player::current))
        .route("/player/devices", get(player::devices))
        .route("/player/play", post(player::play))
        .route("/player/pause", post(player::pause))
        .route("/player/next", post(player::next))
        .route("/player/previous", post(player::previous))
        .route("/player/seek", post(player::seek))
        .route("/player/shuffle", post(player::shuffle))
        .route("/player/repeat", post(player::repeat));

    let api_routes = Router::new()
        .route("/health", get(api::health))
        .nest("/spotify", spotify_routes)
        .route("/artists", get(catalog::list_artists))
        .route("/artists/{id}", get(catalog::get_artist))
        .route("/artists/{id}/albums", get(catalog::artist_albums))
        .route("/artists/{id}/top_tracks", get(catalog::artist_top_tracks))
        .route("/albums", get(catalog::list_albums))
        .route("/albums/{id}", get(catalog::get_album))
        .route("/albums/{id}/tracks", get(catalog::album_tracks))
        .route("/songs", get(catalog::list_songs))
        .route("/songs/{id}", get(catalog::get_song))
        .route("/genres", get(catalog::list_genres))
        .route("/genres/{id}", get(catalog::get_genre))
        .route("/playlists", get(playlists::list).post(playlists::create))
        .route(
            "/playlists/{id}",
            get(playlists::detail)
                .put(playlists::update)
                .patch(playlists::update)
                .delete(playlists::delete),
        )
        .route("/playlists/{id}/add_song", post(playlists::add_song))
        .route(
            "/playlists/{id}/remove_song",
            axum::routing::delete(playlists::remove_song),
        )
        .route(
            "/favorites/songs",
            get(favorites::list_songs)
                .post(favorites::add_song)
                .delete(favorites::remove_song),
        )
        .route(
            "/favorites/artists",
            get(favorites::list_artists)
                .post(favorites::add_artist)
                .delete(favorites::remove_artist),
        )
        .route("/search", get(search::search))
        .route("/sync", get(sync::status).post(sync::run))
        .route("/history", get(history::list).post(history::record));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn start_api_server(state: AppState, addr: &str) -> Res<()> {
    let addr = SocketAddr::from_str(addr)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
