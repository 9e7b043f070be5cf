//! Owned RGB pixel buffer.
//!
//! The canvas is what applications draw on. It implements
//! [`DrawTarget`] so shapes and text come from `embedded-graphics`, and
//! adds the few raster operations composition needs: rectangle fill,
//! crop, paste and quarter-turn rotation.
//!
//! Out-of-range reads return black and out-of-range writes are clipped,
//! the same way an image library treats crop boxes that extend past the
//! edge.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};

/// Channel sum above which a pixel counts as "on".
pub const ON_THRESHOLD: u32 = 400;

/// Whether `px` flips a dot to its bright side.
pub fn is_on(px: Rgb888) -> bool {
    px.r() as u32 + px.g() as u32 + px.b() as u32 > ON_THRESHOLD
}

/// Black or white for a binarized pixel.
pub fn from_bit(on: bool) -> Rgb888 {
    if on { Rgb888::WHITE } else { Rgb888::BLACK }
}

/// A `width × height` RGB image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// A black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb888::BLACK)
    }

    /// A canvas of one solid color.
    pub fn filled(width: u32, height: u32, color: Rgb888) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Pixel at `(x, y)`; black outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb888 {
        self.index(x, y)
            .map(|i| self.pixels[i])
            .unwrap_or(Rgb888::BLACK)
    }

    /// Set one pixel; ignored outside the canvas.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb888) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Fill the whole canvas.
    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Fill `w × h` pixels starting at `(x, y)`, clipped to the canvas.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb888) {
        if x >= self.width || y >= self.height {
            return;
        }
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y..y_end {
            let start = row as usize * self.width as usize;
            self.pixels[start + x as usize..start + x_end as usize].fill(color);
        }
    }

    /// Copy out a `w × h` region whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Canvas {
        let mut out = Canvas::new(w, h);
        for dy in 0..h {
            for dx in 0..w {
                out.set_pixel(
                    dx,
                    dy,
                    self.pixel(x.saturating_add(dx), y.saturating_add(dy)),
                );
            }
        }
        out
    }

    /// Paste `src` with its top-left corner at `(x, y)`, clipped.
    pub fn paste(&mut self, src: &Canvas, x: u32, y: u32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                self.set_pixel(
                    x.saturating_add(sx),
                    y.saturating_add(sy),
                    src.pixels[sy as usize * src.width as usize + sx as usize],
                );
            }
        }
    }

    /// Rotate a quarter turn counter-clockwise; width and height swap.
    ///
    /// The top-right corner ends up top-left.
    pub fn rotate_ccw(&self) -> Canvas {
        let mut out = Canvas::new(self.height, self.width);
        for y in 0..out.height {
            for x in 0..out.width {
                out.set_pixel(x, y, self.pixel(self.width - 1 - y, x));
            }
        }
        out
    }

    /// Rotate a quarter turn clockwise; width and height swap.
    ///
    /// The bottom-left corner ends up top-left.
    pub fn rotate_cw(&self) -> Canvas {
        let mut out = Canvas::new(self.height, self.width);
        for y in 0..out.height {
            for x in 0..out.width {
                out.set_pixel(x, y, self.pixel(y, self.height - 1 - x));
            }
        }
        out
    }

    /// Number of pixels that are "on".
    pub fn count_on(&self) -> usize {
        self.pixels.iter().filter(|&&px| is_on(px)).count()
    }

    /// Binarized rows, top to bottom.
    pub fn bits(&self) -> Vec<Vec<bool>> {
        self.pixels
            .chunks(self.width.max(1) as usize)
            .take(self.height as usize)
            .map(|row| row.iter().map(|&px| is_on(px)).collect())
            .collect()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
