pub mod filters;
pub mod font;
pub mod generators;
pub mod mixer;

use std::sync::Arc;

use crate::{canvas::Canvas, error::LuxelResult};

/// One element of the render tree.
///
/// `render` is depth-first and fully synchronous: a node finishes rendering
/// its children (each into its own scratch canvas shaped like `target`)
/// before combining anything into `target`, and it writes every coordinate
/// of `target` it is responsible for. Output is a pure function of the tree
/// structure, the bound variable values at call time, `time_ms` and the
/// offsets, so identical inputs produce pixel-identical canvases.
///
/// `off_x`/`off_y` translate the sampling window: a pixel `(x, y)` of
/// `target` shows the node's content at logical `(x + off_x, y + off_y)`.
/// Parents pass offsets down to re-position children without copying.
pub trait RenderNode: Send + Sync {
    fn render(
        &self,
        off_x: i32,
        off_y: i32,
        time_ms: u64,
        target: &mut dyn Canvas,
    ) -> LuxelResult<()>;
}

/// Reference-counted node handle. The tree is built once at init time and
/// immutable afterwards; handles may also be held by the variable system or
/// the script builder without risking dangling children across teardown.
pub type SharedNode = Arc<dyn RenderNode>;
