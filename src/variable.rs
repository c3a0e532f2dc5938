use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use crate::{
    error::{LuxelError, LuxelResult},
    script::ScriptEnv,
};

/// Named, lazily-read node parameter. Values are never cached: every
/// `read()` may observe new state.
pub enum Variable<T> {
    /// Fixed at creation.
    Constant(T),
    /// Invokes the bound function fresh on every read.
    Callback(Arc<dyn Fn() -> T + Send + Sync>),
    /// Reads a named global from the active script environment on every
    /// read, converting to `T`.
    Script {
        env: Arc<dyn ScriptEnv>,
        global: String,
    },
}

/// Shared handle to a variable; nodes and the manager hold clones of the
/// same binding.
pub type Var<T> = Arc<Variable<T>>;

impl<T: VarValue> Variable<T> {
    pub fn constant(value: T) -> Var<T> {
        Arc::new(Self::Constant(value))
    }

    pub fn callback(f: impl Fn() -> T + Send + Sync + 'static) -> Var<T> {
        Arc::new(Self::Callback(Arc::new(f)))
    }

    pub fn script(env: Arc<dyn ScriptEnv>, global: impl Into<String>) -> Var<T> {
        Arc::new(Self::Script {
            env,
            global: global.into(),
        })
    }

    pub fn read(&self) -> LuxelResult<T> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Callback(f) => Ok(f()),
            Self::Script { env, global } => T::read_script(env.as_ref(), global),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Script { global, .. } => f.debug_tuple("Script").field(global).finish(),
        }
    }
}

/// The scalar kinds a variable can hold; the script surface speaks exactly
/// this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Int,
    Float,
    Text,
    Bool,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarKind::Int => "int",
            VarKind::Float => "float",
            VarKind::Text => "text",
            VarKind::Bool => "bool",
        })
    }
}

/// Value types storable in a [`Variable`].
pub trait VarValue: Clone + Send + Sync + 'static {
    const KIND: VarKind;

    fn read_script(env: &dyn ScriptEnv, global: &str) -> LuxelResult<Self>;

    fn into_any(var: Var<Self>) -> AnyVariable;

    fn from_any(any: &AnyVariable) -> Option<Var<Self>>;
}

impl VarValue for i64 {
    const KIND: VarKind = VarKind::Int;

    fn read_script(env: &dyn ScriptEnv, global: &str) -> LuxelResult<Self> {
        env.read_int(global)
    }

    fn into_any(var: Var<Self>) -> AnyVariable {
        AnyVariable::Int(var)
    }

    fn from_any(any: &AnyVariable) -> Option<Var<Self>> {
        match any {
            AnyVariable::Int(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl VarValue for f64 {
    const KIND: VarKind = VarKind::Float;

    fn read_script(env: &dyn ScriptEnv, global: &str) -> LuxelResult<Self> {
        env.read_float(global)
    }

    fn into_any(var: Var<Self>) -> AnyVariable {
        AnyVariable::Float(var)
    }

    fn from_any(any: &AnyVariable) -> Option<Var<Self>> {
        match any {
            AnyVariable::Float(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl VarValue for String {
    const KIND: VarKind = VarKind::Text;

    fn read_script(env: &dyn ScriptEnv, global: &str) -> LuxelResult<Self> {
        env.read_text(global)
    }

    fn into_any(var: Var<Self>) -> AnyVariable {
        AnyVariable::Text(var)
    }

    fn from_any(any: &AnyVariable) -> Option<Var<Self>> {
        match any {
            AnyVariable::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl VarValue for bool {
    const KIND: VarKind = VarKind::Bool;

    fn read_script(env: &dyn ScriptEnv, global: &str) -> LuxelResult<Self> {
        env.read_bool(global)
    }

    fn into_any(var: Var<Self>) -> AnyVariable {
        AnyVariable::Bool(var)
    }

    fn from_any(any: &AnyVariable) -> Option<Var<Self>> {
        match any {
            AnyVariable::Bool(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Type-erased variable as stored in the manager.
#[derive(Clone, Debug)]
pub enum AnyVariable {
    Int(Var<i64>),
    Float(Var<f64>),
    Text(Var<String>),
    Bool(Var<bool>),
}

impl AnyVariable {
    pub fn kind(&self) -> VarKind {
        match self {
            AnyVariable::Int(_) => VarKind::Int,
            AnyVariable::Float(_) => VarKind::Float,
            AnyVariable::Text(_) => VarKind::Text,
            AnyVariable::Bool(_) => VarKind::Bool,
        }
    }
}

impl<T: VarValue> From<Var<T>> for AnyVariable {
    fn from(var: Var<T>) -> Self {
        T::into_any(var)
    }
}

/// Registry mapping unique names to type-erased variables. Populated during
/// runtime init (natively or by the loaded script), read during every frame,
/// dropped with the runtime.
#[derive(Debug, Default)]
pub struct VariableManager {
    vars: HashMap<String, AnyVariable>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `var` under `name`. Never overwrites: a taken name is a
    /// `DuplicateVariable` error and the existing binding stays untouched.
    pub fn add(&mut self, name: impl Into<String>, var: impl Into<AnyVariable>) -> LuxelResult<()> {
        match self.vars.entry(name.into()) {
            Entry::Occupied(e) => Err(LuxelError::DuplicateVariable(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(var.into());
                Ok(())
            }
        }
    }

    /// Looks up `name` expecting a variable of type `T`.
    pub fn get<T: VarValue>(&self, name: &str) -> LuxelResult<Var<T>> {
        let any = self
            .vars
            .get(name)
            .ok_or_else(|| LuxelError::VariableNotFound(name.to_string()))?;
        T::from_any(any).ok_or_else(|| LuxelError::VariableTypeMismatch {
            name: name.to_string(),
            expected: T::KIND,
            found: any.kind(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct OneGlobal {
        name: &'static str,
        value: i64,
    }

    impl ScriptEnv for OneGlobal {
        fn read_int(&self, global: &str) -> LuxelResult<i64> {
            if global == self.name {
                Ok(self.value)
            } else {
                Err(LuxelError::conversion(format!("no global '{global}'")))
            }
        }

        fn read_float(&self, global: &str) -> LuxelResult<f64> {
            Err(LuxelError::conversion(format!("no global '{global}'")))
        }

        fn read_text(&self, global: &str) -> LuxelResult<String> {
            Err(LuxelError::conversion(format!("no global '{global}'")))
        }

        fn read_bool(&self, global: &str) -> LuxelResult<bool> {
            Err(LuxelError::conversion(format!("no global '{global}'")))
        }

        fn run_frame_hooks(&self, _time_ms: u64) -> LuxelResult<()> {
            Ok(())
        }
    }

    #[test]
    fn constant_is_stable_over_many_reads() {
        let v = Variable::constant(42i64);
        for _ in 0..1000 {
            assert_eq!(v.read().unwrap(), 42);
        }
    }

    #[test]
    fn callback_sees_external_mutation() {
        let state = Arc::new(AtomicI64::new(10));
        let reader = state.clone();
        let v = Variable::callback(move || reader.load(Ordering::SeqCst));

        assert_eq!(v.read().unwrap(), 10);
        state.store(11, Ordering::SeqCst);
        assert_eq!(v.read().unwrap(), 11);
    }

    #[test]
    fn script_variable_reads_live_global() {
        let env = Arc::new(OneGlobal {
            name: "speed",
            value: 7,
        });
        let v: Var<i64> = Variable::script(env.clone(), "speed");
        assert_eq!(v.read().unwrap(), 7);

        let missing: Var<i64> = Variable::script(env, "absent");
        assert!(matches!(missing.read(), Err(LuxelError::Conversion(_))));
    }

    #[test]
    fn duplicate_add_is_rejected_and_original_kept() {
        let mut m = VariableManager::new();
        m.add("hue", Variable::constant(1i64)).unwrap();
        let err = m.add("hue", Variable::constant(2i64)).unwrap_err();
        assert!(matches!(err, LuxelError::DuplicateVariable(n) if n == "hue"));
        assert_eq!(m.get::<i64>("hue").unwrap().read().unwrap(), 1);
    }

    #[test]
    fn get_reports_missing_and_mismatched() {
        let mut m = VariableManager::new();
        m.add("label", Variable::constant("on".to_string()))
            .unwrap();

        assert!(matches!(
            m.get::<i64>("nope"),
            Err(LuxelError::VariableNotFound(_))
        ));
        match m.get::<i64>("label") {
            Err(LuxelError::VariableTypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, VarKind::Int);
                assert_eq!(found, VarKind::Text);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn manager_tracks_names() {
        let mut m = VariableManager::new();
        assert!(m.is_empty());
        m.add("a", Variable::constant(true)).unwrap();
        m.add("b", Variable::constant(0.5f64)).unwrap();
        assert_eq!(m.len(), 2);
        assert!(m.contains("a"));
        assert!(!m.contains("c"));
    }
}
