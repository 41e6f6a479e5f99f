//! TCP accept loop

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::registry::ClientRegistry;
use super::session::{Session, SessionEnd};
use crate::canvas::Framebuffer;
use crate::errors::{PixelError, Result};
use crate::protocol::Parser;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not
/// spin the reactor.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Source of incoming client connections
pub trait Listener: Send + 'static {
    type Io: AsyncRead + Unpin + Send + 'static;

    /// Wait for the next client. An error affects only this attempt.
    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Io, SocketAddr)>> + Send;
}

impl Listener for TcpListener {
    type Io = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = TcpListener::accept(self).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, "set_nodelay failed: {e}");
        }
        Ok((stream, peer))
    }
}

/// Bound listener plus everything a session needs
pub struct PixelServer<L = TcpListener> {
    listener: L,
    framebuffer: Arc<Framebuffer>,
    registry: Arc<ClientRegistry>,
    parser: Parser,
}

impl PixelServer<TcpListener> {
    /// Bind the listen socket. Failure here is fatal for startup.
    pub async fn bind(
        addr: SocketAddr,
        framebuffer: Arc<Framebuffer>,
        registry: Arc<ClientRegistry>,
        parser: Parser,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| PixelError::Bind { addr, source })?;

        info!(
            addr = %listener.local_addr()?,
            width = framebuffer.width(),
            height = framebuffer.height(),
            alpha = parser.alpha_enabled(),
            "pixel server listening"
        );

        Ok(Self::from_listener(listener, framebuffer, registry, parser))
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

impl<L: Listener> PixelServer<L> {
    /// Serve clients from an already open connection source
    pub fn from_listener(
        listener: L,
        framebuffer: Arc<Framebuffer>,
        registry: Arc<ClientRegistry>,
        parser: Parser,
    ) -> Self {
        Self {
            listener,
            framebuffer,
            registry,
            parser,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Accept clients until `shutdown` becomes `true` (or its sender is
    /// dropped), then stop accepting, let every session see the same signal
    /// and wait for all of them to finish.
    pub async fn serve(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut sessions = JoinSet::new();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let guard = self.registry.register(peer);
                        let session = Session::new(
                            stream,
                            peer,
                            Arc::clone(&self.framebuffer),
                            self.parser,
                        );
                        let shutdown = shutdown.clone();
                        sessions.spawn(async move {
                            let (end, _) = session.run(shutdown).await;
                            if let SessionEnd::Failed(e) = &end {
                                debug!(peer = %guard.peer(), "transport error: {e}");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => {
                        warn!("accept failed: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                // Reap finished sessions so the set does not grow forever
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        warn!("session task failed: {e}");
                    }
                }
            }
        }

        drop(self.listener);
        info!(sessions = sessions.len(), "no longer accepting, waiting for sessions");

        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                warn!("session task failed: {e}");
            }
        }

        info!(clients = self.registry.active(), "pixel server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    /// Hands out whatever the test queues, errors included
    struct QueuedListener {
        incoming: mpsc::UnboundedReceiver<io::Result<(DuplexStream, SocketAddr)>>,
    }

    impl Listener for QueuedListener {
        type Io = DuplexStream;

        async fn accept(&mut self) -> io::Result<(DuplexStream, SocketAddr)> {
            match self.incoming.recv().await {
                Some(next) => next,
                None => std::future::pending().await,
            }
        }
    }

    fn start(
        fb: &Arc<Framebuffer>,
        registry: &Arc<ClientRegistry>,
    ) -> (
        mpsc::UnboundedSender<io::Result<(DuplexStream, SocketAddr)>>,
        watch::Sender<bool>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let (queue, incoming) = mpsc::unbounded_channel();
        let server = PixelServer::from_listener(
            QueuedListener { incoming },
            Arc::clone(fb),
            Arc::clone(registry),
            Parser::new(),
        );
        let (shutdown, rx) = watch::channel(false);
        (queue, shutdown, tokio::spawn(server.serve(rx)))
    }

    #[tokio::test]
    async fn test_failed_accept_keeps_listening() {
        let fb = Arc::new(Framebuffer::new(4, 4).unwrap());
        let registry = Arc::new(ClientRegistry::new());
        let (queue, shutdown, task) = start(&fb, &registry);

        queue
            .send(Err(io::Error::other("too many open files")))
            .unwrap();
        let (mut client, conn) = tokio::io::duplex(64);
        queue
            .send(Ok((conn, "127.0.0.1:40000".parse().unwrap())))
            .unwrap();

        client.write_all(b"PX 2 3 00ff00\n").await.unwrap();
        drop(client);

        timeout(WAIT, async {
            while registry.total() < 1 || registry.active() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(fb.get(2, 3), Some(0xFF00_FF00));

        shutdown.send(true).unwrap();
        timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_repeated_failures_then_clients() {
        let fb = Arc::new(Framebuffer::new(4, 4).unwrap());
        let registry = Arc::new(ClientRegistry::new());
        let (queue, shutdown, task) = start(&fb, &registry);

        let mut clients = Vec::new();
        for port in 0..3u16 {
            queue
                .send(Err(io::Error::from(io::ErrorKind::ConnectionAborted)))
                .unwrap();
            let (client, conn) = tokio::io::duplex(64);
            queue
                .send(Ok((conn, SocketAddr::from(([127, 0, 0, 1], 40000 + port)))))
                .unwrap();
            clients.push(client);
        }

        timeout(WAIT, async {
            while registry.active() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.send(true).unwrap();
        timeout(WAIT, task).await.unwrap().unwrap().unwrap();
        assert_eq!(registry.active(), 0);
        assert_eq!(registry.total(), 3);
        drop(clients);
    }
}
