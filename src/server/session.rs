//! Per-connection read loop

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::canvas::Framebuffer;
use crate::protocol::{Command, Parser};

/// Why a session stopped reading
#[derive(Debug)]
pub enum SessionEnd {
    /// Peer closed the connection
    Closed,
    /// The transport reported an error
    Failed(io::Error),
    /// The server is shutting down
    Shutdown,
}

/// Counters for one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub lines: u64,
    pub pixels: u64,
    pub unrecognized: u64,
}

/// One client connection.
///
/// The session owns its transport. It is moved into the task that drives
/// it, and both the transport and any buffered partial line go away when
/// `run` returns.
pub struct Session<R> {
    reader: BufReader<R>,
    /// Bytes of the line being assembled; survives partial reads
    line: Vec<u8>,
    framebuffer: Arc<Framebuffer>,
    parser: Parser,
    peer: SocketAddr,
    stats: SessionStats,
}

impl<R: AsyncRead + Unpin> Session<R> {
    pub fn new(transport: R, peer: SocketAddr, framebuffer: Arc<Framebuffer>, parser: Parser) -> Self {
        Self {
            reader: BufReader::new(transport),
            line: Vec::with_capacity(64),
            framebuffer,
            parser,
            peer,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Read and apply lines until the peer goes away or `shutdown` flips.
    ///
    /// A trailing line without `\n` is still applied when the peer closes or
    /// the transport fails.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> (SessionEnd, SessionStats) {
        if *shutdown.borrow_and_update() {
            return (SessionEnd::Shutdown, self.stats);
        }

        let end = loop {
            // read_until keeps whatever it already consumed in `self.line`,
            // so losing the race to `shutdown` drops no bytes.
            tokio::select! {
                read = self.reader.read_until(b'\n', &mut self.line) => match read {
                    Ok(0) => break SessionEnd::Closed,
                    Ok(_) => {
                        self.dispatch_line();
                        self.line.clear();
                    }
                    Err(e) => {
                        if !self.line.is_empty() {
                            self.dispatch_line();
                        }
                        break SessionEnd::Failed(e);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break SessionEnd::Shutdown;
                    }
                }
            }
        };

        debug!(
            peer = %self.peer,
            lines = self.stats.lines,
            pixels = self.stats.pixels,
            unrecognized = self.stats.unrecognized,
            "session finished: {:?}",
            end
        );
        (end, self.stats)
    }

    fn dispatch_line(&mut self) {
        let mut line = self.line.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }

        self.stats.lines += 1;
        match self.parser.parse(line) {
            Command::SetPixel { x, y, color, alpha } => {
                self.framebuffer.write(x, y, color, alpha);
                self.stats.pixels += 1;
            }
            Command::SizeQuery => {
                trace!(peer = %self.peer, "SIZE query ignored");
            }
            Command::Unrecognized { raw } => {
                self.stats.unrecognized += 1;
                warn!(
                    peer = %self.peer,
                    len = raw.len(),
                    "unrecognized line: {}",
                    String::from_utf8_lossy(raw)
                );
            }
        }
    }
}
