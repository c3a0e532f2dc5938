//! Luxel is a compositional rendering engine for LED matrix displays.
//!
//! A display is driven by evaluating a tree of render nodes once per frame
//! and flushing the result to a pixel sink:
//!
//! 1. **Generators** ([`Solid`], [`Rainbow`], [`Text`]) produce colors as a
//!    pure function of pixel position, elapsed time and bound variables.
//! 2. **Filters** ([`Brightness`], [`Scroll`]) and the [`Mix`] mixer
//!    transform and combine child output through scratch canvases.
//! 3. The [`Runtime`] owns a [`Canvas`] (in-memory, serpentine LED strip,
//!    or ANSI console) and drives the timed render loop with cooperative
//!    cancellation.
//!
//! Node parameters are [`Variable`]s: constants, native callbacks read
//! fresh every frame, or bindings to globals of an embedded rhai script.
//! A script can build the whole tree at init time through the surface in
//! [`script_rhai`], and keep animating it afterwards via frame hooks and
//! its own globals. The [`Controller`] wraps the lifecycle behind the
//! INIT/START/STOP command surface used by the surrounding firmware.
//!
//! Rendering is deterministic: the same tree, variable values, time and
//! offsets always produce pixel-identical output. No `unsafe` anywhere.
#![forbid(unsafe_code)]

pub mod canvas;
pub mod color;
pub mod config;
pub mod control;
pub mod error;
pub mod node;
pub mod runtime;
pub mod script;
pub mod script_rhai;
pub mod variable;

pub use canvas::console::ConsoleCanvas;
pub use canvas::frame::FrameCanvas;
pub use canvas::strip::{LedSink, StripCanvas};
pub use canvas::{Canvas, PixelLayout};
pub use color::Rgb8;
pub use config::{ConfigStore, JsonConfig};
pub use control::{AppEvent, CanvasFactory, Command, Controller, ControllerState, EventSink};
pub use error::{LuxelError, LuxelResult};
pub use node::filters::{Brightness, Scroll};
pub use node::generators::{Rainbow, Solid, Text};
pub use node::mixer::Mix;
pub use node::{RenderNode, SharedNode};
pub use runtime::{CancelToken, FrameRate, Runtime};
pub use script::{ScriptEnv, ScriptGraph};
pub use script_rhai::{RhaiEnv, load_script, load_source};
pub use variable::{AnyVariable, Var, VarKind, VarValue, Variable, VariableManager};
