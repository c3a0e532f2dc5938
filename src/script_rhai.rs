use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use rhai::{AST, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Position, Scope};

use crate::{
    error::{LuxelError, LuxelResult},
    node::{
        SharedNode,
        filters::{Brightness, Scroll},
        generators::{Rainbow, Solid, Text},
        mixer::Mix,
    },
    script::{ScriptEnv, ScriptGraph},
    variable::{Var, Variable, VariableManager},
};

/// rhai-backed [`ScriptEnv`]. Holds the engine, the compiled AST and the
/// retained top-level scope of the loaded script; script-bound variables
/// read that scope on every frame, frame hooks are called through the
/// engine. Empty until a load completes, so a failed load leaves nothing
/// behind.
pub struct RhaiEnv {
    core: OnceLock<EnvCore>,
}

struct EnvCore {
    engine: Engine,
    ast: AST,
    scope: Mutex<Scope<'static>>,
    hooks: Vec<FnPtr>,
}

impl RhaiEnv {
    fn core(&self) -> LuxelResult<&EnvCore> {
        self.core
            .get()
            .ok_or_else(|| LuxelError::script("script environment is not initialized"))
    }

    fn scope(&self) -> LuxelResult<MutexGuard<'_, Scope<'static>>> {
        self.core()?
            .scope
            .lock()
            .map_err(|_| LuxelError::script("script scope lock poisoned"))
    }
}

impl ScriptEnv for RhaiEnv {
    fn read_int(&self, global: &str) -> LuxelResult<i64> {
        let scope = self.scope()?;
        if !scope.contains(global) {
            return Err(missing_global(global));
        }
        scope
            .get_value::<i64>(global)
            .ok_or_else(|| wrong_type(global, "an int"))
    }

    fn read_float(&self, global: &str) -> LuxelResult<f64> {
        let scope = self.scope()?;
        if !scope.contains(global) {
            return Err(missing_global(global));
        }
        // int globals promote, so scripts may write `let speed = 2;`
        scope
            .get_value::<f64>(global)
            .or_else(|| scope.get_value::<i64>(global).map(|v| v as f64))
            .ok_or_else(|| wrong_type(global, "a float"))
    }

    fn read_text(&self, global: &str) -> LuxelResult<String> {
        let scope = self.scope()?;
        if !scope.contains(global) {
            return Err(missing_global(global));
        }
        scope
            .get_value::<ImmutableString>(global)
            .map(|s| s.to_string())
            .ok_or_else(|| wrong_type(global, "a string"))
    }

    fn read_bool(&self, global: &str) -> LuxelResult<bool> {
        let scope = self.scope()?;
        if !scope.contains(global) {
            return Err(missing_global(global));
        }
        scope
            .get_value::<bool>(global)
            .ok_or_else(|| wrong_type(global, "a bool"))
    }

    fn run_frame_hooks(&self, time_ms: u64) -> LuxelResult<()> {
        let core = self.core()?;
        for hook in &core.hooks {
            hook.call::<Dynamic>(&core.engine, &core.ast, (time_ms as i64,))
                .map_err(|e| LuxelError::script(format!("frame hook failed: {e}")))?;
        }
        Ok(())
    }
}

fn missing_global(global: &str) -> LuxelError {
    LuxelError::conversion(format!("script global '{global}' is not defined"))
}

fn wrong_type(global: &str, expected: &str) -> LuxelError {
    LuxelError::conversion(format!("script global '{global}' is not {expected}"))
}

/// Handle to a registered variable, as passed around inside scripts.
#[derive(Clone)]
pub struct VarRef {
    name: ImmutableString,
}

/// Handle to a constructed render node, as passed around inside scripts.
#[derive(Clone)]
pub struct NodeRef {
    node: SharedNode,
}

struct BuildState {
    width: u32,
    height: u32,
    vars: VariableManager,
    root: Option<SharedNode>,
    hooks: Vec<FnPtr>,
}

type SharedState = Arc<Mutex<BuildState>>;

/// Loads and executes the script at `path`, returning the graph it built.
///
/// The script runs exactly once; through the registered surface it
/// registers variables, constructs nodes, designates a root via
/// `set_root`, and may install `on_frame` hooks. Any read, parse or
/// execution failure (including a script that never calls `set_root`)
/// is a `LuxelError::Script` and constructs nothing.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_script(path: &Path, width: u32, height: u32) -> LuxelResult<ScriptGraph> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        LuxelError::script(format!("cannot read script '{}': {e}", path.display()))
    })?;
    load_source(&source, width, height)
}

/// Same as [`load_script`] for in-memory source.
pub fn load_source(source: &str, width: u32, height: u32) -> LuxelResult<ScriptGraph> {
    crate::canvas::check_dimensions(width, height)?;

    let env = Arc::new(RhaiEnv {
        core: OnceLock::new(),
    });
    let state: SharedState = Arc::new(Mutex::new(BuildState {
        width,
        height,
        vars: VariableManager::new(),
        root: None,
        hooks: Vec::new(),
    }));

    let engine = build_engine(&state, &env);
    let ast = engine
        .compile(source)
        .map_err(|e| LuxelError::script(format!("parse error: {e}")))?;

    let mut scope = Scope::new();
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(|e| LuxelError::script(format!("execution error: {e}")))?;

    let (root, vars, hooks) = {
        let mut st = state
            .lock()
            .map_err(|_| LuxelError::script("script build state poisoned"))?;
        let root = st
            .root
            .take()
            .ok_or_else(|| LuxelError::script("script finished without calling set_root"))?;
        (
            root,
            std::mem::take(&mut st.vars),
            std::mem::take(&mut st.hooks),
        )
    };

    tracing::debug!(
        variables = vars.len(),
        hooks = hooks.len(),
        "script graph loaded"
    );

    env.core
        .set(EnvCore {
            engine,
            ast,
            scope: Mutex::new(scope),
            hooks,
        })
        .map_err(|_| LuxelError::script("script environment initialized twice"))?;

    Ok(ScriptGraph {
        root,
        vars,
        env,
    })
}

fn build_engine(state: &SharedState, env: &Arc<RhaiEnv>) -> Engine {
    let mut engine = Engine::new();

    // Budget limits keep a hostile or runaway script from stalling init or
    // a frame; imports and eval stay off the table entirely.
    engine.set_max_operations(500_000);
    engine.set_max_expr_depths(64, 64);
    engine.set_max_call_levels(64);
    engine.set_max_string_size(4096);
    engine.set_max_array_size(1024);
    engine.set_max_map_size(1024);
    engine.disable_symbol("import");
    engine.disable_symbol("eval");

    engine.on_print(|s| tracing::info!(target: "luxel::script", "{s}"));
    engine.on_debug(|s, _src, pos| tracing::debug!(target: "luxel::script", %pos, "{s}"));

    engine.register_type_with_name::<VarRef>("Var");
    engine.register_type_with_name::<NodeRef>("Node");

    register_variable_api(&mut engine, state, env);
    register_node_api(&mut engine, state);

    engine
}

fn register_variable_api(engine: &mut Engine, state: &SharedState, env: &Arc<RhaiEnv>) {
    let st = state.clone();
    engine.register_fn(
        "var_int",
        move |name: ImmutableString, value: i64| -> Result<VarRef, Box<EvalAltResult>> {
            lock(&st)?
                .vars
                .add(name.as_str(), Variable::constant(value))
                .map_err(api_err)?;
            Ok(VarRef { name })
        },
    );

    let st = state.clone();
    engine.register_fn(
        "var_float",
        move |name: ImmutableString, value: f64| -> Result<VarRef, Box<EvalAltResult>> {
            lock(&st)?
                .vars
                .add(name.as_str(), Variable::constant(value))
                .map_err(api_err)?;
            Ok(VarRef { name })
        },
    );

    // overload so float variables accept integer literals
    let st = state.clone();
    engine.register_fn(
        "var_float",
        move |name: ImmutableString, value: i64| -> Result<VarRef, Box<EvalAltResult>> {
            lock(&st)?
                .vars
                .add(name.as_str(), Variable::constant(value as f64))
                .map_err(api_err)?;
            Ok(VarRef { name })
        },
    );

    let st = state.clone();
    engine.register_fn(
        "var_text",
        move |name: ImmutableString, value: ImmutableString| -> Result<VarRef, Box<EvalAltResult>> {
            lock(&st)?
                .vars
                .add(name.as_str(), Variable::constant(value.to_string()))
                .map_err(api_err)?;
            Ok(VarRef { name })
        },
    );

    let st = state.clone();
    engine.register_fn(
        "var_bool",
        move |name: ImmutableString, value: bool| -> Result<VarRef, Box<EvalAltResult>> {
            lock(&st)?
                .vars
                .add(name.as_str(), Variable::constant(value))
                .map_err(api_err)?;
            Ok(VarRef { name })
        },
    );

    bind_fn::<i64>(engine, state, env, "bind_int");
    bind_fn::<f64>(engine, state, env, "bind_float");
    bind_fn::<String>(engine, state, env, "bind_text");
    bind_fn::<bool>(engine, state, env, "bind_bool");
}

/// Registers one `bind_*` function: a Script-bound variable whose manager
/// name and script global name coincide.
fn bind_fn<T: crate::variable::VarValue>(
    engine: &mut Engine,
    state: &SharedState,
    env: &Arc<RhaiEnv>,
    fn_name: &str,
) {
    let st = state.clone();
    let env = env.clone();
    engine.register_fn(
        fn_name,
        move |name: ImmutableString| -> Result<VarRef, Box<EvalAltResult>> {
            let var: Var<T> =
                Variable::script(env.clone() as Arc<dyn ScriptEnv>, name.as_str());
            lock(&st)?.vars.add(name.as_str(), var).map_err(api_err)?;
            Ok(VarRef { name })
        },
    );
}

fn register_node_api(engine: &mut Engine, state: &SharedState) {
    let st = state.clone();
    engine.register_fn(
        "solid",
        move |color: Dynamic| -> Result<NodeRef, Box<EvalAltResult>> {
            Ok(node(Solid::new(int_var(&st, color)?)))
        },
    );

    let st = state.clone();
    engine.register_fn(
        "rainbow",
        move |step: Dynamic, period_ms: Dynamic| -> Result<NodeRef, Box<EvalAltResult>> {
            Ok(node(Rainbow::new(
                float_var(&st, step)?,
                int_var(&st, period_ms)?,
            )))
        },
    );

    let st = state.clone();
    engine.register_fn(
        "text",
        move |text: Dynamic, color: Dynamic| -> Result<NodeRef, Box<EvalAltResult>> {
            Ok(node(Text::new(
                text_var(&st, text)?,
                int_var(&st, color)?,
            )))
        },
    );

    let st = state.clone();
    engine.register_fn(
        "brightness",
        move |child: NodeRef, percent: Dynamic| -> Result<NodeRef, Box<EvalAltResult>> {
            Ok(node(Brightness::new(child.node, int_var(&st, percent)?)))
        },
    );

    let st = state.clone();
    engine.register_fn(
        "scroll",
        move |child: NodeRef, speed_x: Dynamic, speed_y: Dynamic| -> Result<NodeRef, Box<EvalAltResult>> {
            Ok(node(Scroll::new(
                child.node,
                float_var(&st, speed_x)?,
                float_var(&st, speed_y)?,
            )))
        },
    );

    engine.register_fn("mix", |source: NodeRef, mask: NodeRef| -> NodeRef {
        node(Mix::new(source.node, mask.node))
    });

    let st = state.clone();
    engine.register_fn(
        "set_root",
        move |root: NodeRef| -> Result<(), Box<EvalAltResult>> {
            lock(&st)?.root = Some(root.node);
            Ok(())
        },
    );

    let st = state.clone();
    engine.register_fn(
        "on_frame",
        move |hook: FnPtr| -> Result<(), Box<EvalAltResult>> {
            lock(&st)?.hooks.push(hook);
            Ok(())
        },
    );

    let st = state.clone();
    engine.register_fn("screen_w", move || -> Result<i64, Box<EvalAltResult>> {
        Ok(i64::from(lock(&st)?.width))
    });

    let st = state.clone();
    engine.register_fn("screen_h", move || -> Result<i64, Box<EvalAltResult>> {
        Ok(i64::from(lock(&st)?.height))
    });
}

fn node(n: impl crate::node::RenderNode + 'static) -> NodeRef {
    NodeRef { node: Arc::new(n) }
}

fn lock(state: &SharedState) -> Result<MutexGuard<'_, BuildState>, Box<EvalAltResult>> {
    state
        .lock()
        .map_err(|_| runtime_err("script build state poisoned"))
}

fn runtime_err(msg: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(msg.into()),
        Position::NONE,
    ))
}

fn api_err(e: LuxelError) -> Box<EvalAltResult> {
    runtime_err(e.to_string())
}

/// Coerces a script argument into an int variable: either a `Var` handle
/// resolved through the manager, or a bare integer wrapped as an anonymous
/// constant.
fn int_var(state: &SharedState, v: Dynamic) -> Result<Var<i64>, Box<EvalAltResult>> {
    if let Some(r) = v.clone().try_cast::<VarRef>() {
        return lock(state)?.vars.get::<i64>(r.name.as_str()).map_err(api_err);
    }
    match v.as_int() {
        Ok(i) => Ok(Variable::constant(i)),
        Err(actual) => Err(runtime_err(format!(
            "expected an int or an int variable, got {actual}"
        ))),
    }
}

fn float_var(state: &SharedState, v: Dynamic) -> Result<Var<f64>, Box<EvalAltResult>> {
    if let Some(r) = v.clone().try_cast::<VarRef>() {
        return lock(state)?
            .vars
            .get::<f64>(r.name.as_str())
            .map_err(api_err);
    }
    if let Ok(f) = v.as_float() {
        return Ok(Variable::constant(f));
    }
    match v.as_int() {
        Ok(i) => Ok(Variable::constant(i as f64)),
        Err(actual) => Err(runtime_err(format!(
            "expected a number or a float variable, got {actual}"
        ))),
    }
}

fn text_var(state: &SharedState, v: Dynamic) -> Result<Var<String>, Box<EvalAltResult>> {
    if let Some(r) = v.clone().try_cast::<VarRef>() {
        return lock(state)?
            .vars
            .get::<String>(r.name.as_str())
            .map_err(api_err);
    }
    match v.try_cast::<ImmutableString>() {
        Some(s) => Ok(Variable::constant(s.to_string())),
        None => Err(runtime_err("expected a string or a text variable")),
    }
}
