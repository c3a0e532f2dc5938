use std::sync::Arc;

use crate::{error::LuxelResult, node::SharedNode, variable::VariableManager};

/// Capability surface of an embedded script environment, as seen by the
/// rest of the engine. Script-bound variables read named globals through
/// it at render time; the runtime drives the per-frame hooks through it.
/// Keeping the engine behind this trait means another scripting language
/// can substitute without touching render or runtime logic
/// ([`crate::script_rhai`] is the shipped implementation).
pub trait ScriptEnv: Send + Sync {
    fn read_int(&self, global: &str) -> LuxelResult<i64>;

    fn read_float(&self, global: &str) -> LuxelResult<f64>;

    fn read_text(&self, global: &str) -> LuxelResult<String>;

    fn read_bool(&self, global: &str) -> LuxelResult<bool>;

    /// Runs the hooks the script installed via `on_frame`, in registration
    /// order, with the frame's elapsed milliseconds. A hook error is a
    /// frame fault.
    fn run_frame_hooks(&self, time_ms: u64) -> LuxelResult<()>;
}

/// Everything a successfully loaded script produced: the tree root it
/// built, the variables it registered, and the environment its bound
/// globals live in. Construction is atomic; on any load error none of this
/// exists.
pub struct ScriptGraph {
    pub root: SharedNode,
    pub vars: VariableManager,
    pub env: Arc<dyn ScriptEnv>,
}

impl std::fmt::Debug for ScriptGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptGraph")
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}
