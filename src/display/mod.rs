//! Terminal viewer
//!
//! Reads the framebuffer once per frame and renders it with half-block
//! characters. Runs on its own thread; the only thing it shares with the
//! server is the framebuffer memory.
//!
//! - `app.rs` - viewer state, key handling, frame loop
//! - `terminal.rs` - terminal setup/teardown
//! - `view.rs` - framebuffer widget
//!
//! Keys: `q`/`Esc`/`Ctrl-C` quit, `f` toggles fullscreen.

pub mod app;
pub mod terminal;
pub mod view;

pub use app::Viewer;
pub use view::FramebufferView;

use color_eyre::Result;

/// Take over the terminal, run the viewer, and always restore on exit
pub fn run(viewer: &mut Viewer) -> Result<()> {
    let mut terminal = terminal::init()?;
    let result = viewer.run(&mut terminal);
    terminal::restore()?;
    result
}
