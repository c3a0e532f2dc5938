use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::{
    canvas::Canvas,
    config::ConfigStore,
    error::{LuxelError, LuxelResult},
    node::{SharedNode, generators::Text},
    runtime::{CancelToken, FrameRate, Runtime},
    variable::{Variable, VariableManager},
};

pub const CFG_SCREEN_W: &str = "render.screen.w";
pub const CFG_SCREEN_H: &str = "render.screen.h";
pub const CFG_FRAME_RATE: &str = "render.frameRate";
pub const CFG_INIT_SCRIPT: &str = "render.initScriptPath";

pub const DEFAULT_SCREEN_W: u32 = 19;
pub const DEFAULT_SCREEN_H: u32 = 7;
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Commands delivered by the external dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Init,
    Deinit,
    Reinit,
    Start,
    Stop,
}

/// Events posted back through the [`EventSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// The render loop exited, for any reason.
    LoopStopped,
    /// Human-readable failure report: INIT failures and loop faults.
    Error(String),
}

pub trait EventSink: Send + Sync {
    fn post(&self, event: AppEvent);
}

/// Channel senders work directly as sinks; a full or disconnected receiver
/// drops the event.
impl EventSink for std::sync::mpsc::Sender<AppEvent> {
    fn post(&self, event: AppEvent) {
        let _ = self.send(event);
    }
}

/// Builds the canvas INIT will hand to the runtime, from the configured
/// dimensions. Injected so the same controller drives a console, a strip
/// or a test buffer.
pub type CanvasFactory = Box<dyn Fn(u32, u32) -> LuxelResult<Box<dyn Canvas>> + Send + Sync>;

/// Observable controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Running,
}

enum State {
    Uninitialized,
    Ready(Runtime),
    Running {
        cancel: CancelToken,
        worker: JoinHandle<Runtime>,
    },
}

/// Owns the runtime lifecycle behind the command surface.
///
/// INIT builds canvas and tree from configuration (script-driven when
/// `render.initScriptPath` is set, the built-in screen otherwise), START
/// spawns the render loop on a worker thread, STOP interrupts and joins it,
/// DEINIT releases everything. A loop that stopped on its own (fault) is
/// reaped back to Ready on the next command.
pub struct Controller {
    config: Arc<dyn ConfigStore>,
    events: Arc<dyn EventSink>,
    canvas_factory: CanvasFactory,
    state: State,
}

impl Controller {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        events: Arc<dyn EventSink>,
        canvas_factory: CanvasFactory,
    ) -> Self {
        Self {
            config,
            events,
            canvas_factory,
            state: State::Uninitialized,
        }
    }

    pub fn state(&self) -> ControllerState {
        match self.state {
            State::Uninitialized => ControllerState::Uninitialized,
            State::Ready(_) => ControllerState::Ready,
            State::Running { .. } => ControllerState::Running,
        }
    }

    pub fn dispatch(&mut self, command: Command) -> LuxelResult<()> {
        self.reap_stopped_loop();
        tracing::debug!(?command, "dispatching");
        match command {
            Command::Init => self.init(),
            Command::Deinit => self.deinit(),
            Command::Reinit => self.reinit(),
            Command::Start => self.start(),
            Command::Stop => self.stop(),
        }
    }

    /// A worker that exited without STOP (loop fault) still holds the
    /// runtime; fold it back to Ready so later commands see the state the
    /// loop left behind.
    fn reap_stopped_loop(&mut self) {
        let finished = matches!(&self.state, State::Running { worker, .. } if worker.is_finished());
        if !finished {
            return;
        }
        if let State::Running { worker, .. } =
            std::mem::replace(&mut self.state, State::Uninitialized)
        {
            match worker.join() {
                Ok(runtime) => self.state = State::Ready(runtime),
                Err(_) => tracing::warn!("render worker panicked, runtime lost"),
            }
        }
    }

    fn init(&mut self) -> LuxelResult<()> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(LuxelError::validation(
                "already initialized, deinit first",
            ));
        }
        match self.build_runtime() {
            Ok(runtime) => {
                self.state = State::Ready(runtime);
                Ok(())
            }
            Err(e) => {
                self.events.post(AppEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn build_runtime(&self) -> LuxelResult<Runtime> {
        let width = read_u32(&*self.config, CFG_SCREEN_W, DEFAULT_SCREEN_W)?;
        let height = read_u32(&*self.config, CFG_SCREEN_H, DEFAULT_SCREEN_H)?;
        let rate = FrameRate::new(read_u32(&*self.config, CFG_FRAME_RATE, DEFAULT_FRAME_RATE)?)?;
        let script_path = self.config.get_str(CFG_INIT_SCRIPT).unwrap_or_default();

        let canvas = (self.canvas_factory)(width, height)?;
        tracing::info!(width, height, fps = rate.hz(), script = %script_path, "initializing runtime");

        if script_path.is_empty() {
            default_screen_runtime(canvas, rate)
        } else {
            Runtime::from_script(canvas, rate, Path::new(&script_path))
        }
    }

    fn deinit(&mut self) -> LuxelResult<()> {
        match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Running { cancel, worker } => {
                self.state = State::Running { cancel, worker };
                Err(LuxelError::AlreadyRunning)
            }
            // Ready drops the runtime here; from Uninitialized this is a no-op
            _ => Ok(()),
        }
    }

    fn reinit(&mut self) -> LuxelResult<()> {
        if matches!(self.state, State::Running { .. }) {
            self.stop()?;
        }
        self.deinit()?;
        self.init()
    }

    fn start(&mut self) -> LuxelResult<()> {
        match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Ready(mut runtime) => {
                let cancel = runtime.cancel_token();
                cancel.reset();
                let events = self.events.clone();
                let worker = std::thread::Builder::new()
                    .name("luxel-render".into())
                    .spawn(move || {
                        if let Err(e) = runtime.run_render_loop() {
                            tracing::warn!(error = %e, "render loop faulted");
                            events.post(AppEvent::Error(e.to_string()));
                        }
                        events.post(AppEvent::LoopStopped);
                        runtime
                    })
                    .map_err(|e| {
                        LuxelError::Other(anyhow::Error::new(e).context("spawning render worker"))
                    })?;
                self.state = State::Running { cancel, worker };
                Ok(())
            }
            State::Running { cancel, worker } => {
                self.state = State::Running { cancel, worker };
                Err(LuxelError::AlreadyRunning)
            }
            State::Uninitialized => Err(LuxelError::validation("not initialized")),
        }
    }

    fn stop(&mut self) -> LuxelResult<()> {
        match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Running { cancel, worker } => {
                cancel.cancel();
                match worker.join() {
                    Ok(runtime) => {
                        self.state = State::Ready(runtime);
                        Ok(())
                    }
                    Err(_) => Err(LuxelError::validation("render worker panicked")),
                }
            }
            other => {
                self.state = other;
                Err(LuxelError::NotRunning)
            }
        }
    }
}

fn read_u32(config: &dyn ConfigStore, key: &str, default: u32) -> LuxelResult<u32> {
    match config.get_i64(key) {
        None => Ok(default),
        Some(v) => u32::try_from(v).map_err(|_| {
            LuxelError::validation(format!("config '{key}' must be a non-negative integer, got {v}"))
        }),
    }
}

/// The built-in screen shown when no init script is configured.
fn default_screen_runtime(canvas: Box<dyn Canvas>, rate: FrameRate) -> LuxelResult<Runtime> {
    let mut vars = VariableManager::new();
    vars.add("text", Variable::constant("LOAD".to_string()))?;
    vars.add("text_color", Variable::constant(0x00ffffffi64))?;
    let root: SharedNode = Arc::new(Text::new(vars.get("text")?, vars.get("text_color")?));
    Ok(Runtime::new(canvas, root, vars, rate))
}
