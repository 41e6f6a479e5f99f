//! Shared pixel arena written by client sessions and read by the viewer

use std::sync::atomic::{AtomicU32, Ordering};

use super::compositor::{self, OPAQUE};
use crate::errors::{PixelError, Result};

/// Fixed-size framebuffer of packed ARGB pixels.
///
/// Every pixel is its own `AtomicU32`, so a reader racing a writer always
/// sees a complete old or new value. Writers never lock; two sessions hitting
/// the same pixel simply race and the last store wins. Relaxed ordering is
/// enough because pixels carry no relationship to each other.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    /// Pixel data (row-major, ARGB)
    pixels: Box<[AtomicU32]>,
}

impl Framebuffer {
    /// Allocate a zeroed framebuffer.
    ///
    /// Fails instead of aborting when the dimensions are zero or the
    /// allocation cannot be satisfied.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .filter(|&len| len > 0)
            .ok_or(PixelError::Allocation { width, height })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| PixelError::Allocation { width, height })?;
        pixels.resize_with(len, || AtomicU32::new(0));

        Ok(Self {
            width,
            height,
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Set a pixel, compositing with `alpha` unless it is fully opaque.
    ///
    /// Out-of-range coordinates are dropped without a trace; untrusted
    /// clients send them all the time.
    #[inline]
    pub fn write(&self, x: u32, y: u32, color: u32, alpha: u8) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let cell = &self.pixels[idx];

        if alpha == u8::MAX {
            cell.store(OPAQUE | (color & 0x00FF_FFFF), Ordering::Relaxed);
            return;
        }

        // Separate load and store: a concurrent write to the
        // same pixel may be lost, never torn.
        let dst = cell.load(Ordering::Relaxed);
        cell.store(compositor::blend(color, alpha, dst), Ordering::Relaxed);
    }

    /// Read one pixel
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y)
            .map(|idx| self.pixels[idx].load(Ordering::Relaxed))
    }

    /// Copy pixels in row-major order into `out`, stopping at whichever
    /// runs out first. Returns the number of pixels copied.
    pub fn copy_into(&self, out: &mut [u32]) -> usize {
        let n = out.len().min(self.pixels.len());
        for (dst, src) in out.iter_mut().zip(self.pixels.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        n
    }

    /// Owned copy of the whole grid
    pub fn snapshot(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect()
    }
}
