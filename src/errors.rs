use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while setting up or running the pixel wall
#[derive(Error, Debug)]
pub enum PixelError {
    /// Generic I/O failure outside of a single client session
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The listen socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The framebuffer could not be allocated
    #[error("Failed to allocate a {width}x{height} framebuffer")]
    Allocation { width: u32, height: u32 },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(Arc<String>),

    /// The presentation surface failed
    #[error("Display error: {0}")]
    Display(Arc<String>),
}

/// Type alias for Result with PixelError
pub type Result<T> = std::result::Result<T, PixelError>;

impl PixelError {
    /// Create a configuration error from any message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(Arc::new(message.into()))
    }

    /// Create a display error from any message
    pub fn display(message: impl Into<String>) -> Self {
        Self::Display(Arc::new(message.into()))
    }

    /// Whether the error happened before anything started serving
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. } | Self::Allocation { .. } | Self::Configuration(_)
        )
    }
}
