use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use reminiscence::{cli, config, error, management::SyncOptions};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[clap(about = "Run the HTTP API")]
    Serve(ServeOptions),

    #[clap(about = "Create or update the database schema")]
    Migrate,

    #[clap(about = "Sync a user's Spotify library into the catalog")]
    Sync(SyncCommandOptions),

    #[clap(about = "Find an artist in the catalog or import it from Spotify")]
    SearchArtist(SearchArtistOptions),

    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Listen address, overrides SERVER_ADDRESS
    #[clap(long)]
    addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SyncCommandOptions {
    #[clap(long = "user")]
    user_id: i64,
    #[clap(long)]
    no_playlists: bool,
    #[clap(long)]
    no_saved_tracks: bool,
    #[clap(long)]
    no_top_artists: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArtistOptions {
    name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reminiscence=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => cli::serve(opt.addr).await,
        Command::Migrate => cli::migrate().await,
        Command::Sync(opt) => {
            let options = SyncOptions {
                sync_playlists: !opt.no_playlists,
                sync_saved_tracks: !opt.no_saved_tracks,
                sync_top_artists: !opt.no_top_artists,
            };
            cli::sync(opt.user_id, options).await
        }
        Command::SearchArtist(opt) => cli::search_artist(&opt.name).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
