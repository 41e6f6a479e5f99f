//! Pixel line protocol
//!
//! One command per `\n`-terminated ASCII line:
//!
//! ```text
//! PX <x> <y> <rrggbb>      set a pixel (opaque)
//! PX <x> <y> <rrggbbaa>    set a pixel with alpha (only with the alpha extension)
//! SIZE                     recognized, no reply
//! ```

mod parser;

pub use parser::{parse_line, Command, Parser};

/// Keyword that starts a pixel write
pub const PX: &[u8] = b"PX";

/// Keyword for the size query
pub const SIZE: &[u8] = b"SIZE";
