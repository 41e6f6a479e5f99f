//! Viewer state and frame loop

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};
use tracing::info;

use super::terminal::Tui;
use super::view::FramebufferView;
use crate::canvas::Framebuffer;
use crate::server::ClientRegistry;

mod colors {
    use ratatui::style::Color;
    pub const DIM: Color = Color::DarkGray;
    pub const TEXT: Color = Color::White;
    pub const ACCENT: Color = Color::Rgb(0, 180, 0);
}

/// Terminal viewer for the wall
pub struct Viewer {
    framebuffer: Arc<Framebuffer>,
    /// Copy of the framebuffer taken at the start of each frame
    pixels: Vec<u32>,
    registry: Arc<ClientRegistry>,
    listen: SocketAddr,
    frame_time: Duration,
    /// Hide border and status line
    pub fullscreen: bool,
    pub should_quit: bool,
    /// Set from outside (e.g. a signal) to end the loop
    stop: Arc<AtomicBool>,
}

impl Viewer {
    pub fn new(
        framebuffer: Arc<Framebuffer>,
        registry: Arc<ClientRegistry>,
        listen: SocketAddr,
        fps: u32,
    ) -> Self {
        Self {
            pixels: vec![0; framebuffer.len()],
            framebuffer,
            registry,
            listen,
            frame_time: Duration::from_secs(1) / fps.max(1),
            fullscreen: false,
            should_quit: false,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends `run` at the next frame when set
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Draw every frame and poll input until asked to quit
    pub fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit && !self.stop.load(Ordering::Relaxed) {
            let frame_start = Instant::now();
            terminal.draw(|frame| self.draw(frame))?;

            // Wait out the rest of the frame, but react to keys right away
            let timeout = self.frame_time.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('f') => {
                self.fullscreen = !self.fullscreen;
                info!(fullscreen = self.fullscreen, "toggled fullscreen");
            }
            _ => {}
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        self.framebuffer.copy_into(&mut self.pixels);

        let area = frame.area();
        let view = FramebufferView::new(
            &self.pixels,
            self.framebuffer.width(),
            self.framebuffer.height(),
        );

        if self.fullscreen {
            frame.render_widget(view, area);
            return;
        }

        let [canvas_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        let block = Block::bordered()
            .title(" pixelwall ")
            .border_style(Style::default().fg(colors::DIM));
        let inner = block.inner(canvas_area);
        frame.render_widget(block, canvas_area);
        frame.render_widget(view, inner);

        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }

    fn status_line(&self) -> Line<'static> {
        let dim = Style::default().fg(colors::DIM);
        Line::from(vec![
            Span::styled(
                format!("{}x{}", self.framebuffer.width(), self.framebuffer.height()),
                Style::default().fg(colors::TEXT),
            ),
            Span::styled("  ", dim),
            Span::styled(self.listen.to_string(), Style::default().fg(colors::TEXT)),
            Span::styled("  clients: ", dim),
            Span::styled(
                self.registry.active().to_string(),
                Style::default().fg(colors::ACCENT),
            ),
            Span::styled("  [f] fullscreen  [q] quit", dim),
        ])
        .style(Style::default().bg(Color::Reset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn viewer() -> Viewer {
        let fb = Arc::new(Framebuffer::new(4, 4).unwrap());
        fb.write(0, 0, 0xFF_00_00, 255);
        Viewer::new(
            fb,
            Arc::new(ClientRegistry::new()),
            "127.0.0.1:1337".parse().unwrap(),
            60,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn test_quit_keys() {
        for key in [
            press(KeyCode::Char('q')),
            press(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut viewer = viewer();
            viewer.handle_key(key);
            assert!(viewer.should_quit);
        }
    }

    #[test]
    fn test_plain_c_does_not_quit() {
        let mut viewer = viewer();
        viewer.handle_key(press(KeyCode::Char('c')));
        assert!(!viewer.should_quit);
    }

    #[test]
    fn test_fullscreen_toggle() {
        let mut viewer = viewer();
        viewer.handle_key(press(KeyCode::Char('f')));
        assert!(viewer.fullscreen);
        viewer.handle_key(press(KeyCode::Char('f')));
        assert!(!viewer.fullscreen);
    }

    #[test]
    fn test_frame_time_from_fps() {
        assert_eq!(viewer().frame_time(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn test_windowed_draw_has_status_line() {
        let mut viewer = viewer();
        let mut terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
        terminal.draw(|frame| viewer.draw(frame)).unwrap();

        let status = row_text(&terminal, 5);
        assert!(status.contains("4x4"), "{status}");
        assert!(status.contains("127.0.0.1:1337"), "{status}");
        assert!(status.contains("clients: 0"), "{status}");
        assert!(row_text(&terminal, 0).contains("pixelwall"));
    }

    #[test]
    fn test_fullscreen_draw_fills_area() {
        let mut viewer = viewer();
        viewer.fullscreen = true;
        let mut terminal = Terminal::new(TestBackend::new(4, 2)).unwrap();
        terminal.draw(|frame| viewer.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(0, 0)].symbol(), "▀");
        assert_eq!(buffer[(0, 0)].fg, Color::Rgb(255, 0, 0));
        assert_eq!(buffer[(3, 1)].symbol(), "▀");
    }

    #[test]
    fn test_each_frame_sees_new_writes() {
        let mut viewer = viewer();
        viewer.fullscreen = true;
        let mut terminal = Terminal::new(TestBackend::new(4, 2)).unwrap();
        terminal.draw(|frame| viewer.draw(frame)).unwrap();
        assert_eq!(terminal.backend().buffer()[(3, 0)].fg, Color::Rgb(0, 0, 0));

        viewer.framebuffer.write(3, 0, 0x00_00_FF, 255);
        terminal.draw(|frame| viewer.draw(frame)).unwrap();
        assert_eq!(terminal.backend().buffer()[(3, 0)].fg, Color::Rgb(0, 0, 255));
    }
}
