//! Wall configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or none at all) gives a working 800x600 wall on port 1337.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PixelError, Result};
use crate::protocol::Parser;

/// Highest frame rate the viewer accepts
pub const MAX_FPS: u32 = 240;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub canvas: CanvasConfig,
    pub protocol: ProtocolConfig,
    pub display: DisplayConfig,
}

/// Listen socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 1337,
        }
    }
}

/// Framebuffer dimensions, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Protocol extensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Accept `PX x y rrggbbaa`
    pub alpha: bool,
}

/// Terminal viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fps: 60,
        }
    }
}

impl Config {
    /// Socket address to listen on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind, self.server.port)
    }

    /// Parser matching the protocol section
    pub fn parser(&self) -> Parser {
        Parser::new().with_alpha(self.protocol.alpha)
    }

    /// Reject values the wall cannot run with
    pub fn validate(&self) -> Result<()> {
        let CanvasConfig { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(PixelError::config(format!(
                "canvas must be at least 1x1, got {width}x{height}"
            )));
        }
        if (width as usize).checked_mul(height as usize).is_none() {
            return Err(PixelError::config(format!(
                "canvas {width}x{height} is too large"
            )));
        }
        if !(1..=MAX_FPS).contains(&self.display.fps) {
            return Err(PixelError::config(format!(
                "display.fps must be between 1 and {MAX_FPS}, got {}",
                self.display.fps
            )));
        }
        Ok(())
    }
}

/// Parse a TOML document
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| PixelError::config(format!("Invalid TOML config: {e}")))
}

/// Load configuration from `path`, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(path).map_err(|e| {
        PixelError::config(format!("Failed to read config {}: {e}", path.display()))
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:1337".parse::<SocketAddr>().unwrap());
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 600);
        assert!(!config.protocol.alpha);
        assert!(config.display.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [canvas]
            width = 320

            [protocol]
            alpha = true
            "#,
        )
        .unwrap();
        assert_eq!(config.canvas.width, 320);
        assert_eq!(config.canvas.height, 600);
        assert!(config.parser().alpha_enabled());
        assert_eq!(config.server.port, 1337);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config("[server]\nprot = 1\n").unwrap_err();
        assert!(err.to_string().contains("Invalid TOML config"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.canvas.height = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1\"\nport = 4242").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:4242".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert!(err.is_startup());
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), Config::default());
    }
}
