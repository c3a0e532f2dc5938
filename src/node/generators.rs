use crate::{
    canvas::Canvas,
    color::Rgb8,
    error::LuxelResult,
    node::{RenderNode, font},
    variable::Var,
};

/// Fills the whole target with one color. The color variable is read once
/// per frame, packed as `0xRRGGBB`.
pub struct Solid {
    color: Var<i64>,
}

impl Solid {
    pub fn new(color: Var<i64>) -> Self {
        Self { color }
    }
}

impl RenderNode for Solid {
    fn render(
        &self,
        _off_x: i32,
        _off_y: i32,
        _time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let color = Rgb8::from_rgb_u32(self.color.read()? as u32);
        for y in 0..target.height() {
            for x in 0..target.width() {
                target.set_pixel(x, y, color)?;
            }
        }
        Ok(())
    }
}

/// Hue sweep across columns, cycling over time.
///
/// `step_deg` is the hue advance per pixel column; `period_ms` is the time
/// for a full 360-degree cycle (values below 1 are treated as 1). Hue at a
/// pixel is `360 * (t mod period) / period + step * logical_x`, wrapped.
pub struct Rainbow {
    step_deg: Var<f64>,
    period_ms: Var<i64>,
}

impl Rainbow {
    pub fn new(step_deg: Var<f64>, period_ms: Var<i64>) -> Self {
        Self { step_deg, period_ms }
    }
}

impl RenderNode for Rainbow {
    fn render(
        &self,
        off_x: i32,
        _off_y: i32, // the sweep runs along x only
        time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let step = self.step_deg.read()?;
        let period = self.period_ms.read()?.max(1) as u64;
        let phase = 360.0 * ((time_ms % period) as f64) / (period as f64);

        for y in 0..target.height() {
            for x in 0..target.width() {
                let lx = i64::from(x) + i64::from(off_x);
                let hue = phase + step * lx as f64;
                target.set_pixel(x, y, Rgb8::from_hsv(hue, 1.0, 1.0))?;
            }
        }
        Ok(())
    }
}

/// Renders a line of text in the built-in 3x5 font, vertically centered,
/// starting at logical x = 0. Pixels outside glyphs are black; characters
/// without a glyph occupy a blank cell. Pair with a scroll filter for text
/// wider than the canvas.
pub struct Text {
    text: Var<String>,
    color: Var<i64>,
}

impl Text {
    pub fn new(text: Var<String>, color: Var<i64>) -> Self {
        Self { text, color }
    }
}

impl RenderNode for Text {
    fn render(
        &self,
        off_x: i32,
        off_y: i32,
        _time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let text = self.text.read()?;
        let color = Rgb8::from_rgb_u32(self.color.read()? as u32);
        let glyphs: Vec<Option<[u8; 5]>> = text.chars().map(font::glyph).collect();
        let top = i64::from(target.height().saturating_sub(font::GLYPH_HEIGHT)) / 2;

        for y in 0..target.height() {
            for x in 0..target.width() {
                let lx = i64::from(x) + i64::from(off_x);
                let ly = i64::from(y) + i64::from(off_y);
                target.set_pixel(x, y, self.sample(&glyphs, color, lx, ly - top))?;
            }
        }
        Ok(())
    }
}

impl Text {
    fn sample(&self, glyphs: &[Option<[u8; 5]>], color: Rgb8, lx: i64, row: i64) -> Rgb8 {
        if lx < 0 || row < 0 || row >= i64::from(font::GLYPH_HEIGHT) {
            return Rgb8::BLACK;
        }
        let cell = (lx / i64::from(font::ADVANCE)) as usize;
        let col = (lx % i64::from(font::ADVANCE)) as u32;
        match glyphs.get(cell) {
            Some(Some(rows)) if font::is_set(*rows, col, row as u32) => color,
            _ => Rgb8::BLACK,
        }
    }
}
