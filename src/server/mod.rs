//! Pixel protocol server
//!
//! ```text
//! +----------+    accept     +----------+  line   +--------+  write  +-------------+
//! | Acceptor | ------------> | Session  | ------> | Parser | ------> | Framebuffer |
//! +----------+               +----------+         +--------+         +-------------+
//!      |                          |
//!      v                          v
//! +----------+  guard dropped when the session task returns
//! | Registry | <---------------------------------------------
//! +----------+
//! ```
//!
//! All sessions run as tasks on one tokio runtime. They share nothing except
//! the framebuffer, so there is no lock between them.

mod acceptor;
mod registry;
mod session;

pub use acceptor::{Listener, PixelServer};
pub use registry::{ClientGuard, ClientRegistry};
pub use session::{Session, SessionEnd, SessionStats};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::canvas::Framebuffer;
use crate::errors::{PixelError, Result};
use crate::protocol::Parser;

/// A server running on the current runtime
pub struct ServerHandle {
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Bind and start accepting in a background task
    pub async fn start(
        addr: SocketAddr,
        framebuffer: Arc<Framebuffer>,
        parser: Parser,
    ) -> Result<Self> {
        let registry = Arc::new(ClientRegistry::new());
        let server = PixelServer::bind(addr, framebuffer, Arc::clone(&registry), parser).await?;
        let local_addr = server.local_addr()?;

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(server.serve(rx));

        Ok(Self {
            local_addr,
            registry,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Stop accepting, end every session and wait for all of them
    pub async fn shutdown(self) -> Result<()> {
        if self.shutdown.send(true).is_err() {
            warn!("accept loop already gone before shutdown");
        }
        self.task
            .await
            .map_err(|e| PixelError::Io(std::io::Error::other(e.to_string())))?
    }
}
