use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::{
    canvas::Canvas,
    error::{LuxelError, LuxelResult},
    node::SharedNode,
    script::ScriptEnv,
    script_rhai,
    variable::VariableManager,
};

/// Whole frames per second driven by the render loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRate(u32);

impl FrameRate {
    pub fn new(hz: u32) -> LuxelResult<Self> {
        if hz == 0 {
            return Err(LuxelError::validation("frame rate must be > 0"));
        }
        Ok(Self(hz))
    }

    pub fn hz(self) -> u32 {
        self.0
    }

    pub fn frame_period(self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.0))
    }
}

/// Cooperative cancellation flag shared between the render loop and its
/// controller. Purely advisory: the loop polls it once per frame boundary,
/// so cancellation latency is bounded by one frame period and an in-flight
/// frame always completes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arms the token for a fresh loop start.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the canvas, the tree root and the registered variables, and drives
/// the timed render loop. Built on INIT, run on START, interrupted on STOP,
/// dropped on DEINIT; the owner must join a running loop before dropping
/// (the loop borrows the runtime exclusively, the type system enforces the
/// rest).
pub struct Runtime {
    canvas: Box<dyn Canvas>,
    root: SharedNode,
    vars: VariableManager,
    frame_rate: FrameRate,
    cancel: CancelToken,
    script: Option<Arc<dyn ScriptEnv>>,
}

impl Runtime {
    pub fn new(
        canvas: Box<dyn Canvas>,
        root: SharedNode,
        vars: VariableManager,
        frame_rate: FrameRate,
    ) -> Self {
        Self {
            canvas,
            root,
            vars,
            frame_rate,
            cancel: CancelToken::new(),
            script: None,
        }
    }

    /// Builds the tree by running the script at `path` against the given
    /// canvas (the script sees the canvas dimensions). Fails with
    /// `LuxelError::Script` without constructing anything if the script
    /// cannot be read, parsed or executed.
    pub fn from_script(
        canvas: Box<dyn Canvas>,
        frame_rate: FrameRate,
        path: &Path,
    ) -> LuxelResult<Self> {
        let graph = script_rhai::load_script(path, canvas.width(), canvas.height())?;
        Ok(Self {
            canvas,
            root: graph.root,
            vars: graph.vars,
            frame_rate,
            cancel: CancelToken::new(),
            script: Some(graph.env),
        })
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    pub fn vars(&self) -> &VariableManager {
        &self.vars
    }

    /// Handle for cancelling the loop from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Requests loop exit at the next frame boundary.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    /// Runs the render loop until interrupted or faulted.
    ///
    /// Elapsed time is measured from loop entry, so animations restart from
    /// zero on every START. After each frame the loop sleeps one fixed
    /// frame period regardless of how long render and display took; under
    /// overload the frame rate drifts rather than skipping frames. A frame
    /// fault (hook, render or display error) ends the loop and is returned
    /// to the caller.
    #[tracing::instrument(skip(self), fields(fps = self.frame_rate.hz()))]
    pub fn run_render_loop(&mut self) -> LuxelResult<()> {
        let period = self.frame_rate.frame_period();
        let started = Instant::now();
        tracing::debug!("render loop started");

        while !self.cancel.is_cancelled() {
            let elapsed = started.elapsed().as_millis() as u64;
            if let Some(env) = &self.script {
                env.run_frame_hooks(elapsed)?;
            }
            self.root.render(0, 0, elapsed, self.canvas.as_mut())?;
            self.canvas.display()?;
            std::thread::sleep(period);
        }

        tracing::debug!("render loop interrupted");
        Ok(())
    }
}
