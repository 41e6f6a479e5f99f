//! Command line arguments

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Shared TCP pixel canvas with a terminal viewer
#[derive(Debug, Clone, Parser)]
#[command(name = "pixelwall", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// TCP port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Accept `PX x y rrggbbaa` with an alpha byte
    #[arg(long)]
    pub alpha: bool,

    /// Run without the terminal viewer until Ctrl-C
    #[arg(long)]
    pub headless: bool,

    /// Viewer frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Log connection changes and unrecognized lines
    #[arg(short, long)]
    pub verbose: bool,

    /// Log per-session detail
    #[arg(long)]
    pub debug: bool,

    /// Append logs to this file [default: stderr when headless,
    /// pixelwall.log in the temp directory while the viewer runs]
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Log file used while the viewer owns the terminal
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("pixelwall.log")
}

impl Cli {
    /// Override file values with whatever was given on the command line
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(width) = self.width {
            config.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.canvas.height = height;
        }
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        if self.alpha {
            config.protocol.alpha = true;
        }
        if self.headless {
            config.display.enabled = false;
        }
        config
    }

    /// File to log into, or `None` for stderr. Stderr is the viewer's
    /// terminal, so with the viewer on logs always go to a file.
    pub fn log_path(&self, viewer: bool) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| viewer.then(default_log_path))
    }

    /// Log level selected by the flags
    pub fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
