//! Taking over the terminal for the viewer and giving it back
//!
//! The viewer draws on the alternate screen in raw mode. `leave` undoes both
//! and runs on a normal exit as well as from the panic hook.

use std::io::{self, Stdout, Write};
use std::panic;

use color_eyre::Result;
use crossterm::{cursor, execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};

/// Terminal the viewer draws on
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Install color-eyre's report and panic hooks, then put `on_panic` in front
/// of them. color-eyre replaces the panic hook outright, so it has to go
/// first or `on_panic` would never run.
fn install_hooks<F>(on_panic: F)
where
    F: Fn() + Send + Sync + 'static,
{
    // a second viewer run finds it already installed
    let _ = color_eyre::install();

    let next = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        on_panic();
        next(info);
    }));
}

fn enter(out: &mut impl Write) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::SetTitle("pixelwall")
    )
}

fn leave(out: &mut impl Write) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(out, terminal::LeaveAlternateScreen, cursor::Show)
}

/// Switch to raw mode on the alternate screen with the cursor hidden
pub fn init() -> Result<Tui> {
    install_hooks(|| {
        let _ = leave(&mut io::stdout());
    });
    enter(&mut io::stdout())?;

    Ok(Terminal::new(CrosstermBackend::new(io::stdout()))?)
}

/// Give the terminal back in the state `init` found it
pub fn restore() -> Result<()> {
    leave(&mut io::stdout())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_panic_runs_restore_after_color_eyre() {
        static RESTORED: AtomicBool = AtomicBool::new(false);

        install_hooks(|| RESTORED.store(true, Ordering::SeqCst));
        let result = panic::catch_unwind(|| panic!("viewer thread crashed"));

        assert!(result.is_err());
        assert!(RESTORED.load(Ordering::SeqCst));
    }
}
