// Shared helpers for the server integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pixelwall::{ClientRegistry, Framebuffer, Parser, ServerHandle};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start a server on an ephemeral loopback port
pub async fn start_server(width: u32, height: u32, parser: Parser) -> (ServerHandle, Arc<Framebuffer>) {
    let framebuffer = Arc::new(Framebuffer::new(width, height).expect("framebuffer"));
    let addr: SocketAddr = "127.0.0.1:0".parse().expect("addr");
    let server = ServerHandle::start(addr, Arc::clone(&framebuffer), parser)
        .await
        .expect("server start");
    (server, framebuffer)
}

/// Poll until the registry reports `expected` live clients
pub async fn wait_for_clients(registry: &ClientRegistry, expected: usize) {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while registry.active() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry stuck at {} (wanted {expected})", registry.active()));
}
