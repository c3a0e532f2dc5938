pub mod console;
pub mod frame;
pub mod strip;

use crate::{color::Rgb8, error::LuxelResult};

/// Addressable pixel grid a render tree draws into.
///
/// Dimensions are fixed at construction. Out-of-range coordinates are a
/// `LuxelError::Bounds` on host-facing canvases ([`frame::FrameCanvas`],
/// [`console::ConsoleCanvas`]); the hardware-facing [`strip::StripCanvas`]
/// instead discards bad writes and reads back black, so a misbehaving node
/// cannot take down a live display. Each implementation documents which
/// policy it follows.
pub trait Canvas: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb8) -> LuxelResult<()>;

    fn get_pixel(&self, x: u32, y: u32) -> LuxelResult<Rgb8>;

    /// Flushes the current buffer to the underlying sink.
    fn display(&mut self) -> LuxelResult<()>;
}

/// How `(x, y)` maps onto the physical pixel chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// Linear row-major order, `y*width + x`.
    Continuous,
    /// Serpentine wiring: odd rows run right-to-left, as on strips folded
    /// back and forth into a matrix.
    Zigzag,
}

impl PixelLayout {
    pub const fn index(self, x: u32, y: u32, width: u32) -> usize {
        let x = match self {
            PixelLayout::Continuous => x,
            PixelLayout::Zigzag => {
                if y % 2 == 0 {
                    x
                } else {
                    width - 1 - x
                }
            }
        };
        // widened before the multiply so grids past 2^32 pixels still index
        y as usize * width as usize + x as usize
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> LuxelResult<()> {
    if width == 0 || height == 0 {
        return Err(crate::error::LuxelError::validation(
            "canvas dimensions must be non-zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_is_row_major() {
        let l = PixelLayout::Continuous;
        assert_eq!(l.index(0, 0, 4), 0);
        assert_eq!(l.index(3, 0, 4), 3);
        assert_eq!(l.index(0, 1, 4), 4);
        assert_eq!(l.index(3, 1, 4), 7);
    }

    #[test]
    fn zigzag_reverses_odd_rows() {
        let l = PixelLayout::Zigzag;
        // row 0 scans left-to-right
        for x in 0..4 {
            assert_eq!(l.index(x, 0, 4), x as usize);
        }
        // row 1 scans right-to-left
        assert_eq!(l.index(0, 1, 4), 7);
        assert_eq!(l.index(1, 1, 4), 6);
        assert_eq!(l.index(2, 1, 4), 5);
        assert_eq!(l.index(3, 1, 4), 4);
        // row 2 flips back
        assert_eq!(l.index(0, 2, 4), 8);
    }

    #[test]
    fn index_widens_past_u32_for_large_grids() {
        // 100_000 x 100_000 exceeds u32 pixel counts
        assert_eq!(
            PixelLayout::Continuous.index(99_999, 99_999, 100_000) as u64,
            9_999_999_999
        );
        assert_eq!(
            PixelLayout::Zigzag.index(0, 99_999, 100_000) as u64,
            9_999_999_999
        );
    }
}
