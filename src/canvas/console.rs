use std::fmt::Write as _;
use std::io::Write as _;

use crate::{
    canvas::{Canvas, check_dimensions},
    color::Rgb8,
    error::{LuxelError, LuxelResult},
};

/// Development canvas that paints the matrix as ANSI truecolor cells on
/// stdout, one frame over the previous (cursor re-homed each `display()`).
/// Strict bounds policy: out-of-range access is an error.
pub struct ConsoleCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb8>,
}

impl ConsoleCanvas {
    pub fn new(width: u32, height: u32) -> LuxelResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![Rgb8::BLACK; width as usize * height as usize],
        })
    }

    fn offset(&self, x: u32, y: u32) -> LuxelResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(LuxelError::bounds(x, y, self.width, self.height));
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    fn paint(&self) -> String {
        // Each pixel is two background-colored spaces so cells come out
        // roughly square in a terminal font.
        let mut out = String::with_capacity(self.width as usize * self.height as usize * 22 + 8);
        out.push_str("\x1b[0;0H");
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.pixels[y as usize * self.width as usize + x as usize];
                let _ = write!(out, "\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b);
            }
            out.push_str("\x1b[0m\n");
        }
        out
    }
}

impl Canvas for ConsoleCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb8) -> LuxelResult<()> {
        let i = self.offset(x, y)?;
        self.pixels[i] = color;
        Ok(())
    }

    fn get_pixel(&self, x: u32, y: u32) -> LuxelResult<Rgb8> {
        let i = self.offset(x, y)?;
        Ok(self.pixels[i])
    }

    fn display(&mut self) -> LuxelResult<()> {
        let frame = self.paint();
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(frame.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| LuxelError::Other(anyhow::Error::new(e).context("console display")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_bounds_like_other_host_canvases() {
        let mut c = ConsoleCanvas::new(2, 2).unwrap();
        assert!(c.set_pixel(1, 1, Rgb8::WHITE).is_ok());
        assert!(matches!(
            c.set_pixel(2, 0, Rgb8::WHITE),
            Err(LuxelError::Bounds { .. })
        ));
        assert!(matches!(c.get_pixel(0, 2), Err(LuxelError::Bounds { .. })));
    }

    #[test]
    fn paint_homes_cursor_and_colors_cells() {
        let mut c = ConsoleCanvas::new(2, 1).unwrap();
        c.set_pixel(0, 0, Rgb8::new(1, 2, 3)).unwrap();
        let s = c.paint();
        assert!(s.starts_with("\x1b[0;0H"));
        assert!(s.contains("\x1b[48;2;1;2;3m  "));
        assert!(s.contains("\x1b[48;2;0;0;0m  "));
        assert!(s.ends_with("\x1b[0m\n"));
    }
}
