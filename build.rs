//! Build script for Reminiscence.
//!
//! Copies the `.env.example` template into the local data directory so the
//! server finds a ready-to-edit configuration next to its SQLite database:
//!
//! - Linux: `~/.local/share/reminiscence/.env.example`
//! - macOS: `~/Library/Application Support/reminiscence/.env.example`
//! - Windows: `%LOCALAPPDATA%/reminiscence/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("reminiscence");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    // Sandboxed builds may not be allowed to touch the data dir.
    if let Err(e) = fs::create_dir_all(&out_dir) {
        println!("cargo:warning=cannot create {}: {}", out_dir.display(), e);
        return Ok(());
    }

    let contents = fs::read_to_string(&env_example_path)?;
    if let Err(e) = fs::write(out_dir.join(".env.example"), contents) {
        println!("cargo:warning=cannot copy .env.example: {}", e);
    }

    Ok(())
}
