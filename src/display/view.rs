//! Half-block framebuffer widget
//!
//! Each terminal cell shows 2 vertical pixels with `▀`:
//! - foreground = top pixel
//! - background = bottom pixel
//!
//! The framebuffer is stretched to whatever area it is given, sampling the
//! nearest pixel. It renders a plain copy of the pixels taken once per frame,
//! so a frame never mixes reads from before and after a long render.

use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::canvas::channels;

const UPPER_HALF: char = '▀';

/// Renders row-major framebuffer pixels into a ratatui buffer
#[derive(Debug, Clone, Copy)]
pub struct FramebufferView<'a> {
    pixels: &'a [u32],
    width: u32,
    height: u32,
}

impl<'a> FramebufferView<'a> {
    pub fn new(pixels: &'a [u32], width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Missing pixels (a short slice) render black
    #[inline]
    fn pixel(&self, x: u32, y: u32) -> u32 {
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels.get(idx).copied().unwrap_or(0)
    }
}

/// Map a cell coordinate onto `source` pixels spread over `target` cells
#[inline]
fn sample(pos: u32, target: u32, source: u32) -> u32 {
    (u64::from(pos) * u64::from(source) / u64::from(target)) as u32
}

#[inline]
fn to_color(pixel: u32) -> Color {
    let (r, g, b) = channels(pixel);
    Color::Rgb(r, g, b)
}

impl Widget for FramebufferView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let cols = u32::from(area.width);
        let subrows = u32::from(area.height) * 2;

        for row in 0..area.height {
            let top_y = sample(u32::from(row) * 2, subrows, self.height);
            let bot_y = sample(u32::from(row) * 2 + 1, subrows, self.height);

            for col in 0..area.width {
                let x = sample(u32::from(col), cols, self.width);
                let top = self.pixel(x, top_y);
                let bot = self.pixel(x, bot_y);

                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char(UPPER_HALF)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bot));
                }
            }
        }
    }
}
