use crate::{
    canvas::{Canvas, check_dimensions},
    color::Rgb8,
    error::{LuxelError, LuxelResult},
};

/// In-memory scratch canvas used as the intermediate target of node
/// composition. Strict bounds policy: out-of-range access is an error.
/// `display()` is a no-op since there is no sink behind it.
#[derive(Clone, Debug)]
pub struct FrameCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb8>,
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> LuxelResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![Rgb8::BLACK; width as usize * height as usize],
        })
    }

    /// Scratch buffer shaped like `target`, for rendering children into.
    pub fn like(target: &dyn Canvas) -> LuxelResult<Self> {
        Self::new(target.width(), target.height())
    }

    /// Row-major pixel slice.
    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> LuxelResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(LuxelError::bounds(x, y, self.width, self.height));
        }
        Ok(y as usize * self.width as usize + x as usize)
    }
}

impl Canvas for FrameCanvas {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_black_and_stores_writes() {
        let mut c = FrameCanvas::new(3, 2).unwrap();
        assert_eq!(c.get_pixel(2, 1).unwrap(), Rgb8::BLACK);
        c.set_pixel(2, 1, Rgb8::new(1, 2, 3)).unwrap();
        assert_eq!(c.get_pixel(2, 1).unwrap(), Rgb8::new(1, 2, 3));
        assert_eq!(c.get_pixel(0, 0).unwrap(), Rgb8::BLACK);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut c = FrameCanvas::new(3, 2).unwrap();
        assert!(matches!(
            c.set_pixel(3, 0, Rgb8::WHITE),
            Err(LuxelError::Bounds { x: 3, y: 0, .. })
        ));
        assert!(matches!(
            c.get_pixel(0, 2),
            Err(LuxelError::Bounds { .. })
        ));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(FrameCanvas::new(0, 5).is_err());
        assert!(FrameCanvas::new(5, 0).is_err());
    }

    #[test]
    fn like_matches_target_shape() {
        let target = FrameCanvas::new(7, 4).unwrap();
        let scratch = FrameCanvas::like(&target).unwrap();
        assert_eq!(scratch.width(), 7);
        assert_eq!(scratch.height(), 4);
    }
}
