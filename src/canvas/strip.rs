use crate::{
    canvas::{Canvas, PixelLayout, check_dimensions},
    color::Rgb8,
    error::LuxelResult,
};

/// Transport for the strip's wire-order byte frame. Implementations wrap
/// whatever pushes bytes at the physical chain (RMT peripheral, SPI, a test
/// recorder); electrical timing stays behind this seam.
pub trait LedSink: Send {
    fn write(&mut self, grb: &[u8]) -> LuxelResult<()>;
}

/// Canvas over a serial LED chain. Pixels are kept in wire order (GRB, the
/// WS2812 byte layout) so `display()` can hand the buffer to the sink as-is.
///
/// Lenient bounds policy: writes outside the grid are silently dropped and
/// reads come back black. A node bug must not fault a live display; the
/// host-facing canvases are the ones that report coordinate misuse.
pub struct StripCanvas {
    width: u32,
    height: u32,
    layout: PixelLayout,
    buf: Vec<u8>,
    sink: Box<dyn LedSink>,
}

impl StripCanvas {
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        sink: Box<dyn LedSink>,
    ) -> LuxelResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            layout,
            buf: vec![0; width as usize * height as usize * 3],
            sink,
        })
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}

impl Canvas for StripCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb8) -> LuxelResult<()> {
        if x >= self.width || y >= self.height {
            return Ok(()); // dropped, see bounds policy above
        }
        let i = self.layout.index(x, y, self.width) * 3;
        self.buf[i] = color.g;
        self.buf[i + 1] = color.r;
        self.buf[i + 2] = color.b;
        Ok(())
    }

    fn get_pixel(&self, x: u32, y: u32) -> LuxelResult<Rgb8> {
        if x >= self.width || y >= self.height {
            return Ok(Rgb8::BLACK);
        }
        let i = self.layout.index(x, y, self.width) * 3;
        Ok(Rgb8::new(self.buf[i + 1], self.buf[i], self.buf[i + 2]))
    }

    fn display(&mut self) -> LuxelResult<()> {
        self.sink.write(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl LedSink for RecordingSink {
        fn write(&mut self, grb: &[u8]) -> LuxelResult<()> {
            self.frames.lock().unwrap().push(grb.to_vec());
            Ok(())
        }
    }

    #[test]
    fn zigzag_places_odd_row_pixels_from_the_right() {
        let sink = RecordingSink::default();
        let frames = sink.frames.clone();
        let mut c = StripCanvas::new(4, 2, PixelLayout::Zigzag, Box::new(sink)).unwrap();

        c.set_pixel(0, 1, Rgb8::new(10, 20, 30)).unwrap();
        c.set_pixel(3, 1, Rgb8::new(1, 2, 3)).unwrap();
        c.display().unwrap();

        let frame = frames.lock().unwrap().pop().unwrap();
        // (0,1) lands at chain index 7, (3,1) at 4; three bytes per pixel
        assert_eq!(&frame[7 * 3..7 * 3 + 3], &[20, 10, 30]); // GRB order
        assert_eq!(&frame[4 * 3..4 * 3 + 3], &[2, 1, 3]);
    }

    #[test]
    fn continuous_row_zero_is_untouched_by_layout() {
        let sink = RecordingSink::default();
        let frames = sink.frames.clone();
        let mut c = StripCanvas::new(4, 2, PixelLayout::Continuous, Box::new(sink)).unwrap();

        for x in 0..4 {
            c.set_pixel(x, 0, Rgb8::new(x as u8, 0, 0)).unwrap();
        }
        c.display().unwrap();

        let frame = frames.lock().unwrap().pop().unwrap();
        for x in 0..4usize {
            assert_eq!(frame[x * 3 + 1], x as u8);
        }
    }

    #[test]
    fn out_of_range_access_is_silent() {
        let sink = RecordingSink::default();
        let mut c = StripCanvas::new(4, 2, PixelLayout::Zigzag, Box::new(sink)).unwrap();

        c.set_pixel(4, 0, Rgb8::WHITE).unwrap();
        c.set_pixel(0, 2, Rgb8::WHITE).unwrap();
        assert_eq!(c.get_pixel(9, 9).unwrap(), Rgb8::BLACK);
        // nothing leaked into the buffer
        for x in 0..4 {
            for y in 0..2 {
                assert_eq!(c.get_pixel(x, y).unwrap(), Rgb8::BLACK);
            }
        }
    }

    #[test]
    fn readback_round_trips_wire_order() {
        let sink = RecordingSink::default();
        let mut c = StripCanvas::new(3, 3, PixelLayout::Zigzag, Box::new(sink)).unwrap();
        c.set_pixel(1, 1, Rgb8::new(9, 8, 7)).unwrap();
        assert_eq!(c.get_pixel(1, 1).unwrap(), Rgb8::new(9, 8, 7));
    }
}
