//! # pixelwall
//!
//! A shared framebuffer on the network. Clients connect over TCP and send
//! `PX <x> <y> <rrggbb>` lines; every accepted pixel lands in one
//! `W x H` canvas that a terminal viewer keeps on screen.
//!
//! - [`canvas`] - atomic pixel arena and compositing
//! - [`protocol`] - line parser
//! - [`server`] - accept loop, sessions, client registry
//! - [`display`] - terminal viewer
//! - [`config`] / [`cli`] - TOML file and command line

pub mod canvas;
pub mod cli;
pub mod config;
pub mod display;
pub mod errors;
pub mod protocol;
pub mod server;

pub use canvas::Framebuffer;
pub use config::Config;
pub use errors::{PixelError, Result};
pub use protocol::{Command, Parser};
pub use server::{ClientRegistry, PixelServer, ServerHandle};
