use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{Image, SimplifiedAlbum, SimplifiedArtist};

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    random_alphanumeric(32)
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Formats a duration in milliseconds as `m:ss`.
pub fn format_duration(duration_ms: u64) -> String {
    let total_seconds = duration_ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parses a Spotify release date of `day`, `month` or `year` precision.
///
/// Returns the date (first day of the month/year for coarser precisions)
/// together with the release year.
pub fn parse_release_date(raw: &str) -> Option<(NaiveDate, i32)> {
    let raw = raw.trim();
    let date = match raw.len() {
        4 => NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1)?,
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()?,
        _ => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?,
    };
    Some((date, date.year()))
}

/// Parses an RFC 3339 timestamp such as `2024-03-01T12:00:00Z`, falling
/// back to the current time.
pub fn parse_timestamp_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

pub fn first_image_url(images: &[Image]) -> Option<String> {
    images.first().map(|i| i.url.clone())
}

pub fn join_artist_names(artists: &[SimplifiedArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drops albums whose name (case-insensitive) was already seen.
///
/// Spotify lists regional and deluxe re-releases as separate albums; the
/// first occurrence wins.
pub fn remove_duplicate_albums(albums: &mut Vec<SimplifiedAlbum>) {
    let mut seen_names = HashSet::new();
    albums.retain(|album| seen_names.insert(album.name.to_lowercase()));
}

/// Username candidate for a Spotify sign-up.
///
/// The first attempt is the email itself; later attempts use the local
/// part with a numeric suffix.
pub fn username_candidate(email: &str, attempt: u32) -> String {
    if attempt == 0 {
        return email.to_string();
    }
    let local = email.split('@').next().unwrap_or(email);
    format!("{local}_{attempt}")
}

/// Splits a display name into first name and the remaining words.
pub fn split_display_name(display_name: &str) -> (String, String) {
    let mut parts = display_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}
