//! cpv - Counterpress Frame Viewer CLI
//!
//! Browse ball-loss events, render a frame to PNG, export the sequence
//! around a loss as a looping GIF.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cp_core::{ActionFilter, CancelFlag, CounterpressViewer, EventTable, FocalPlayer, FrameNo, LossEvent, MatchId, ViewerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cpv", version = cp_core::VERSION)]
#[command(about = "Inspect counterpress ball losses frame by frame", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Player + action filter narrowing of the event table
#[derive(Args)]
struct Selection {
    /// Tracked player name, e.g. "Vinicius Jr"
    #[arg(long)]
    player: String,

    /// all | near | involved
    #[arg(long, default_value = "all")]
    filter: ActionFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked players
    Players,

    /// List matches with ball losses for a player
    Matches {
        #[command(flatten)]
        selection: Selection,
    },

    /// List loss frames for a player in one match
    Frames {
        #[command(flatten)]
        selection: Selection,

        #[arg(long = "match")]
        match_id: MatchId,
    },

    /// Render one frame around a ball loss to PNG
    View {
        #[command(flatten)]
        selection: Selection,

        #[arg(long = "match")]
        match_id: MatchId,

        #[arg(long)]
        frame_loss: FrameNo,

        /// Frame to show (defaults to the loss frame; snaps to the nearest present frame)
        #[arg(long)]
        frame: Option<FrameNo>,

        /// Output PNG path
        #[arg(long)]
        out: PathBuf,
    },

    /// Export the sequence around a ball loss as a GIF
    Export {
        #[command(flatten)]
        selection: Selection,

        #[arg(long = "match")]
        match_id: MatchId,

        #[arg(long)]
        frame_loss: FrameNo,

        /// Frames before/after the loss (10..=150, step 10)
        #[arg(long)]
        padding: Option<u32>,

        /// Output directory (overrides the config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cp_core=debug,cp_cli=debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "config loaded");
    Ok(config)
}

fn focal_player(config: &ViewerConfig, name: &str) -> Result<FocalPlayer> {
    match config.tracked_player(name) {
        Some(player) => Ok(player.clone()),
        None => {
            let known: Vec<&str> = config.tracked_players.iter().map(|p| p.name.as_str()).collect();
            bail!("'{}' is not a tracked player (known: {})", name, known.join(", "))
        }
    }
}

fn load_events(config: &ViewerConfig) -> Result<EventTable> {
    let path = config.events_path();
    EventTable::load(&path).with_context(|| format!("Failed to load event table: {}", path.display()))
}

fn find_event(table: &EventTable, selection: &Selection, match_id: MatchId, frame_loss: FrameNo) -> Result<LossEvent> {
    table
        .select(&selection.player, selection.filter)
        .event(match_id, frame_loss)
        .cloned()
        .with_context(|| {
            format!(
                "No '{}' ball loss for {} in match {} at frame {}",
                selection.filter, selection.player, match_id, frame_loss
            )
        })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Players => {
            for player in &config.tracked_players {
                println!("{:>6}  {}", player.id, player.name);
            }
        }

        Commands::Matches { selection } => {
            let table = load_events(&config)?;
            let matches = table.select(&selection.player, selection.filter).matches();
            if matches.is_empty() {
                println!("No ball losses for {} ({})", selection.player, selection.filter);
            }
            for match_id in matches {
                println!("{}", match_id);
            }
        }

        Commands::Frames { selection, match_id } => {
            let table = load_events(&config)?;
            let frames = table.select(&selection.player, selection.filter).frame_losses(match_id);
            if frames.is_empty() {
                println!("No ball losses for {} in match {} ({})", selection.player, match_id, selection.filter);
            }
            for frame in frames {
                println!("{}", frame);
            }
        }

        Commands::View { selection, match_id, frame_loss, frame, out } => {
            let focal = focal_player(&config, &selection.player)?;
            let table = load_events(&config)?;
            let event = find_event(&table, &selection, match_id, frame_loss)?;

            let mut viewer = CounterpressViewer::open(config)?;
            let view = viewer.view(&event, Some(&focal), frame)?;
            view.snapshot
                .write_png(&out)
                .with_context(|| format!("Failed to write PNG: {}", out.display()))?;

            println!(
                "Frame {} of window {}..={} ({} present) → {}",
                view.shown_frame,
                view.window.first(),
                view.window.last(),
                view.window.len(),
                out.display()
            );
            if view.snapshot.stats.unresolved > 0 {
                println!("{} players without roster entry", view.snapshot.stats.unresolved);
            }
        }

        Commands::Export { selection, match_id, frame_loss, padding, out_dir } => {
            let focal = focal_player(&config, &selection.player)?;
            let table = load_events(&config)?;
            let event = find_event(&table, &selection, match_id, frame_loss)?;

            if let Some(dir) = out_dir {
                // relative to where cpv runs, not to the data directory
                config.output_dir = std::env::current_dir().context("Failed to read working directory")?.join(dir);
            }
            let mut viewer = CounterpressViewer::open(config)?;
            let report = viewer.export(&event, &focal, padding, &CancelFlag::new())?;

            println!(
                "{} frames ({} requested) → {}",
                report.frame_numbers.len(),
                report.requested,
                report.path.display()
            );
        }
    }

    Ok(())
}
