//! # Canvas
//!
//! The shared framebuffer and the integer compositing it applies on write.
//!
//! ```text
//!   sessions (reactor)              viewer (own thread)
//!   ──────────────────              ───────────────────
//!   write(x, y, c, a) ──┐        ┌── copy_into() / snapshot()
//!                       ▼        │
//!                ┌──────────────────────┐
//!                │  Framebuffer         │
//!                │  [AtomicU32; W * H]  │
//!                └──────────────────────┘
//! ```
//!
//! Producers write, the consumer polls. There is no lock or channel between
//! the two sides.

mod compositor;
mod framebuffer;

pub use compositor::{blend, channels, OPAQUE};
pub use framebuffer::Framebuffer;
