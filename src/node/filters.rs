use crate::{
    canvas::{Canvas, frame::FrameCanvas},
    error::LuxelResult,
    node::{RenderNode, SharedNode},
    variable::Var,
};

/// Scales every channel of the child's output by `percent/100`, clamped to
/// the channel range. Values above 100 amplify; negative values read as 0.
pub struct Brightness {
    child: SharedNode,
    percent: Var<i64>,
}

impl Brightness {
    pub fn new(child: SharedNode, percent: Var<i64>) -> Self {
        Self { child, percent }
    }
}

impl RenderNode for Brightness {
    fn render(
        &self,
        off_x: i32,
        off_y: i32,
        time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let percent = self.percent.read()?.clamp(0, i64::from(u32::MAX)) as u32;
        let mut scratch = FrameCanvas::like(target)?;
        self.child.render(off_x, off_y, time_ms, &mut scratch)?;

        for y in 0..target.height() {
            for x in 0..target.width() {
                let c = scratch.get_pixel(x, y)?;
                target.set_pixel(x, y, c.scale(percent, 100))?;
            }
        }
        Ok(())
    }
}

/// Translates the child's content over time by shifting the sampling
/// window: speeds are pixels per second, positive values move content
/// toward negative x/y (the window itself slides right/down).
pub struct Scroll {
    child: SharedNode,
    speed_x: Var<f64>,
    speed_y: Var<f64>,
}

impl Scroll {
    pub fn new(child: SharedNode, speed_x: Var<f64>, speed_y: Var<f64>) -> Self {
        Self {
            child,
            speed_x,
            speed_y,
        }
    }
}

fn shift_offset(base: i32, speed: f64, time_ms: u64) -> i32 {
    let shift = (speed * time_ms as f64 / 1000.0).floor() as i64;
    (i64::from(base) + shift).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl RenderNode for Scroll {
    fn render(
        &self,
        off_x: i32,
        off_y: i32,
        time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let sx = self.speed_x.read()?;
        let sy = self.speed_y.read()?;
        self.child.render(
            shift_offset(off_x, sx, time_ms),
            shift_offset(off_y, sy, time_ms),
            time_ms,
            target,
        )
    }
}
