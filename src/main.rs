use std::fs::OpenOptions;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser as _;

use pixelwall::cli::Cli;
use pixelwall::config::{load_config, Config};
use pixelwall::display::{self, Viewer};
use pixelwall::{Framebuffer, PixelError, ServerHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(load_config(cli.config.as_deref())?);
    config.validate()?;
    init_logging(&cli, config.display.enabled)?;

    tracing::info!("Starting pixelwall version {}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "effective configuration");

    match run(&config).await {
        Ok(()) => {
            tracing::info!("pixelwall stopped");
            Ok(())
        }
        Err(e) => {
            let startup = e
                .downcast_ref::<PixelError>()
                .is_some_and(PixelError::is_startup);
            if startup {
                tracing::error!("pixelwall failed to start: {e:#}");
            } else {
                tracing::error!("pixelwall failed: {e:#}");
            }
            Err(e)
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let framebuffer = Arc::new(
        Framebuffer::new(config.canvas.width, config.canvas.height)
            .context("allocating framebuffer")?,
    );

    let server = ServerHandle::start(
        config.listen_addr(),
        Arc::clone(&framebuffer),
        config.parser(),
    )
    .await
    .context("starting pixel server")?;

    let outcome = if config.display.enabled {
        run_viewer(config, &framebuffer, &server).await
    } else {
        tracing::info!(addr = %server.local_addr(), "running headless, Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")
    };

    tracing::info!("Shutting down...");
    server.shutdown().await.context("stopping pixel server")?;
    drop(framebuffer);

    outcome
}

/// Run the terminal viewer on a blocking thread until the user quits or
/// Ctrl-C arrives as a signal
async fn run_viewer(
    config: &Config,
    framebuffer: &Arc<Framebuffer>,
    server: &ServerHandle,
) -> anyhow::Result<()> {
    let mut viewer = Viewer::new(
        Arc::clone(framebuffer),
        Arc::clone(server.registry()),
        server.local_addr(),
        config.display.fps,
    );
    let stop = viewer.stop_flag();
    let mut task = tokio::task::spawn_blocking(move || display::run(&mut viewer));

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            stop.store(true, Ordering::Relaxed);
            task.await
        }
    };

    joined
        .context("viewer thread")?
        .map_err(|report| PixelError::display(format!("{report:?}")))
        .context("terminal viewer")
}

fn init_logging(cli: &Cli, viewer: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level().into());

    match cli.log_path(viewer) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
        }
    }
    Ok(())
}
