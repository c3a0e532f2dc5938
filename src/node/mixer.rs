use crate::{
    canvas::{Canvas, frame::FrameCanvas},
    error::LuxelResult,
    node::{RenderNode, SharedNode},
};

/// Combines two children: `source` masked by `mask`, per pixel and per
/// channel via the `(a*b)/255` masking multiply. A white mask passes the
/// source through, a black one blanks it, anything between attenuates.
/// Both children render into their own scratch canvas shaped like the
/// target before the combine, so neither sees partial output.
pub struct Mix {
    source: SharedNode,
    mask: SharedNode,
}

impl Mix {
    pub fn new(source: SharedNode, mask: SharedNode) -> Self {
        Self { source, mask }
    }
}

impl RenderNode for Mix {
    fn render(
        &self,
        off_x: i32,
        off_y: i32,
        time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()> {
        let mut source = FrameCanvas::like(target)?;
        let mut mask = FrameCanvas::like(target)?;
        self.source.render(off_x, off_y, time_ms, &mut source)?;
        self.mask.render(off_x, off_y, time_ms, &mut mask)?;

        for y in 0..target.height() {
            for x in 0..target.width() {
                let combined = source.get_pixel(x, y)? * mask.get_pixel(x, y)?;
                target.set_pixel(x, y, combined)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb8;
    use crate::node::generators::{Solid, Text};
    use crate::variable::Variable;
    use std::sync::Arc;

    #[test]
    fn gray_mask_attenuates_source() {
        let source = Arc::new(Solid::new(Variable::constant(0xff0000)));
        let mask = Arc::new(Solid::new(Variable::constant(0x808080)));
        let node = Mix::new(source, mask);

        let mut c = FrameCanvas::new(2, 1).unwrap();
        node.render(0, 0, 0, &mut c).unwrap();
        assert_eq!(c.get_pixel(0, 0).unwrap(), Rgb8::new(128, 0, 0));
    }

    #[test]
    fn text_mask_stencils_source() {
        let source = Arc::new(Solid::new(Variable::constant(0x00ffff)));
        let mask = Arc::new(Text::new(
            Variable::constant("I".to_string()),
            Variable::constant(0xffffff),
        ));
        let node = Mix::new(source, mask);

        let mut c = FrameCanvas::new(4, 5).unwrap();
        node.render(0, 0, 0, &mut c).unwrap();

        let cyan = Rgb8::new(0, 255, 255);
        assert_eq!(c.get_pixel(1, 0).unwrap(), cyan); // inside the I
        assert_eq!(c.get_pixel(0, 1).unwrap(), Rgb8::BLACK); // outside
        assert_eq!(c.get_pixel(3, 2).unwrap(), Rgb8::BLACK); // gap column
    }

    #[test]
    fn offsets_reach_both_children() {
        let source = Arc::new(Solid::new(Variable::constant(0xffffff)));
        let mask = Arc::new(Text::new(
            Variable::constant("HI".to_string()),
            Variable::constant(0xffffff),
        ));
        let node = Mix::new(source, mask);

        let mut shifted = FrameCanvas::new(3, 5).unwrap();
        node.render(4, 0, 0, &mut shifted).unwrap();
        // the window now starts at the 'I' cell
        assert_eq!(shifted.get_pixel(0, 0).unwrap(), Rgb8::WHITE);
        assert_eq!(shifted.get_pixel(1, 0).unwrap(), Rgb8::WHITE);
    }

    #[test]
    fn render_is_deterministic() {
        let source = Arc::new(Solid::new(Variable::constant(0x123456)));
        let mask = Arc::new(Text::new(
            Variable::constant("OK".to_string()),
            Variable::constant(0xcccccc),
        ));
        let node = Mix::new(source, mask);

        let mut a = FrameCanvas::new(8, 5).unwrap();
        let mut b = FrameCanvas::new(8, 5).unwrap();
        node.render(1, -1, 345, &mut a).unwrap();
        node.render(1, -1, 345, &mut b).unwrap();
        assert_eq!(a.pixels(), b.pixels());
    }
}
