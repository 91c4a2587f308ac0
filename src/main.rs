//! Binary entrypoint for slideloop.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use slideloop::catalog::MediaCatalog;
use slideloop::config::DisplayOrderMode;
use slideloop::decode::StillImageDecoder;
use slideloop::engine::{self, Engine};
use slideloop::events::{DisplayCommand, InputAction};
use slideloop::settings::YamlSettings;
use slideloop::video::{LoggingVideoBackend, VideoEnded};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "slideloop", about = "Unattended image and video slideshow")]
struct Cli {
    /// Path to the YAML settings file
    #[arg(short, long, value_name = "FILE", default_value = "slideloop.yaml")]
    config: PathBuf,

    /// Override the media folder
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Override the per-image delay (seconds, 1-300)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<u64>,

    /// Override the display order (random, date-ascending, date-descending)
    #[arg(long, value_name = "ORDER")]
    order: Option<DisplayOrderMode>,

    /// Mute video audio
    #[arg(long)]
    mute: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("slideloop={}", level).parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let settings = YamlSettings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let mut cfg = settings.config().clone();
    if let Some(folder) = cli.folder {
        cfg.folder_path = folder;
    }
    if let Some(delay) = cli.delay {
        cfg.delay_seconds = delay;
    }
    if let Some(order) = cli.order {
        cfg.display_order = order;
    }
    if cli.mute {
        cfg.mute_videos = true;
    }
    cfg.validate().context("validating configuration")?;

    let catalog = MediaCatalog::load(&cfg.folder_path, cfg.include_subfolders, cfg.display_order);
    info!(
        count = catalog.len(),
        folder = %cfg.folder_path.display(),
        order = %cfg.display_order,
        "enumerated media"
    );

    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<DisplayCommand>();
    let (input_tx, input_rx) = mpsc::channel::<InputAction>(16);
    let (video_end_tx, video_end_rx) = mpsc::channel::<VideoEnded>(4);
    let cancel = CancellationToken::new();

    let decoder = StillImageDecoder::new(cfg.max_width, cfg.max_height);
    let video = LoggingVideoBackend::new(video_end_tx, Duration::from_secs(10));
    let engine = Engine::new(catalog, cfg, decoder, video, command_tx);

    // Presenter: a real deployment renders these directives; here they are
    // logged so the engine can be observed headless.
    let presenter = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            log_command(&command);
        }
    });

    spawn_input_bridge(input_tx);

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received; shutting down");
            signal_cancel.cancel();
        }
    });

    let engine_task = tokio::spawn(engine::run(engine, input_rx, video_end_rx, cancel));
    engine_task.await.context("engine task failed")??;
    let _ = presenter.await;
    Ok(())
}

/// Map line-based terminal input onto the discrete actions a remote control
/// would deliver: n=next, p=previous, empty line=play/pause, o=overlay,
/// q=back.
fn spawn_input_bridge(tx: mpsc::Sender<InputAction>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let action = match line.trim() {
                        "n" | "next" => Some(InputAction::Next),
                        "p" | "prev" => Some(InputAction::Previous),
                        "" => Some(InputAction::TogglePlayPause),
                        "o" | "overlay" => Some(InputAction::ToggleOverlay),
                        "q" | "back" => Some(InputAction::Back),
                        other => {
                            warn!(input = other, "unrecognized input");
                            None
                        }
                    };
                    if let Some(action) = action {
                        if tx.blocking_send(action).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => break,
            }
        }
    });
}

fn log_command(command: &DisplayCommand) {
    match command {
        DisplayCommand::ShowImage { surface, image } => {
            info!(?surface, width = image.width, height = image.height, "show image");
        }
        DisplayCommand::CrossfadeImage {
            surface,
            image,
            fade,
        } => {
            info!(
                ?surface,
                width = image.width,
                height = image.height,
                fade = %humantime::format_duration(*fade),
                "crossfade"
            );
        }
        DisplayCommand::ShowVideo { path, .. } => info!(path = %path.display(), "show video"),
        DisplayCommand::HideVideo => info!("hide video"),
        DisplayCommand::Overlay { visible, info } => {
            info!(
                visible,
                position = info.position,
                total = info.total,
                playing = info.playing,
                "overlay"
            );
        }
        DisplayCommand::Status(status) => info!(?status, "status"),
    }
}
