//! Binary entrypoint for the folder slideshow.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use folder_slideshow::config::Configuration;
use folder_slideshow::events::InventoryEvent;
use folder_slideshow::processing::caption::CaptionStyle;
use folder_slideshow::processing::text::load_font;
use folder_slideshow::scan;
use folder_slideshow::slideshow::Slideshow;
use folder_slideshow::tasks;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "folder-slideshow",
    version,
    about = "Fullscreen slideshow of a watched image folder"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the watched folder
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Override the monitor index
    #[arg(long, value_name = "INDEX")]
    screen: Option<usize>,

    /// Override the per-image display duration (e.g. "5s", "1m")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

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
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("folder_slideshow={level}").parse()?)
        .add_directive("winit=warn".parse()?)
        .add_directive("notify=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn load_configuration(cli: &Cli) -> Result<Configuration> {
    let mut cfg = if cli.config.exists() {
        Configuration::from_yaml_file(&cli.config)
            .with_context(|| format!("loading config from {}", cli.config.display()))?
    } else if cli.folder.is_some() {
        Configuration::default()
    } else {
        bail!(
            "config file {} not found and no --folder given",
            cli.config.display()
        );
    };
    if let Some(folder) = &cli.folder {
        cfg.folder_path = folder.clone();
    }
    if let Some(screen) = cli.screen {
        cfg.screen_id = screen;
    }
    if let Some(duration) = cli.duration {
        cfg.display_duration = duration;
    }
    cfg.validated().context("invalid configuration values")
}

fn caption_style(cfg: &Configuration) -> Option<CaptionStyle> {
    if cfg.prompt_lines == 0 {
        return None;
    }
    match load_font(cfg.caption_font_family.as_deref()) {
        Ok(font) => Some(CaptionStyle::new(
            font,
            cfg.caption_font_size,
            cfg.caption_wrap_width,
            cfg.prompt_lines,
        )),
        Err(err) => {
            warn!(error = %err, "captions disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = load_configuration(&cli)?;
    scan::ensure_folder(&cfg.folder_path).context("cannot watch image folder")?;
    info!(
        folder = %cfg.folder_path.display(),
        screen_id = cfg.screen_id,
        display_duration = %humantime::format_duration(cfg.display_duration),
        prompt_lines = cfg.prompt_lines,
        "configuration loaded"
    );

    let captions = caption_style(&cfg);

    // Files -> Slideshow
    let (inv_tx, inv_rx) = mpsc::channel::<InventoryEvent>(256);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut workers = JoinSet::new();
    workers.spawn({
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        async move {
            tasks::files::run(cfg, inv_tx, cancel)
                .await
                .context("files task failed")
        }
    });

    // The window must live on the main thread; this returns once the user quits.
    let slideshow = Slideshow::new(cfg.ticks_per_image(), inv_rx);
    let viewer_result = tasks::viewer::run_windowed(slideshow, cfg, captions, cancel.clone())
        .context("viewer failed");

    cancel.cancel();
    while let Some(res) = workers.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("task error: {e:?}"),
            Err(e) => error!("join error: {e}"),
        }
    }
    info!("slideshow stopped");
    viewer_result
}
