use std::path::Path;

use anyhow::Context as _;
use serde_json::Value;

use crate::error::{LuxelError, LuxelResult};

/// Dot-path configuration reader and writer, e.g. `render.screen.w`.
/// Getters return `None` for a missing or differently-typed value; callers
/// apply their own defaults. Object-safe so the controller can hold any
/// backing store.
pub trait ConfigStore: Send + Sync {
    fn get_i64(&self, path: &str) -> Option<i64>;

    fn get_f64(&self, path: &str) -> Option<f64>;

    fn get_str(&self, path: &str) -> Option<String>;

    fn get_bool(&self, path: &str) -> Option<bool>;

    fn put_i64(&mut self, path: &str, value: i64);

    fn put_f64(&mut self, path: &str, value: f64);

    fn put_str(&mut self, path: &str, value: &str);

    fn put_bool(&mut self, path: &str, value: bool);
}

/// [`ConfigStore`] over a JSON object tree. `put` creates intermediate
/// objects along the path, replacing any non-object value standing in the
/// way.
#[derive(Clone, Debug)]
pub struct JsonConfig {
    root: Value,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            root: Value::Object(serde_json::Map::new()),
        }
    }
}

impl JsonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> LuxelResult<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| LuxelError::validation(format!("config parse error: {e}")))?;
        if !root.is_object() {
            return Err(LuxelError::validation("config root must be a JSON object"));
        }
        Ok(Self { root })
    }

    pub fn from_file(path: &Path) -> LuxelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::from_json(&text)
    }

    fn node(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.root, |v, key| v.get(key))
    }

    fn put_value(&mut self, path: &str, value: Value) {
        let mut cur = &mut self.root;
        for key in path.split('.') {
            if !cur.is_object() {
                *cur = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = cur {
                cur = map.entry(key).or_insert(Value::Null);
            }
        }
        *cur = value;
    }
}

impl ConfigStore for JsonConfig {
    fn get_i64(&self, path: &str) -> Option<i64> {
        self.node(path)?.as_i64()
    }

    fn get_f64(&self, path: &str) -> Option<f64> {
        self.node(path)?.as_f64()
    }

    fn get_str(&self, path: &str) -> Option<String> {
        self.node(path)?.as_str().map(str::to_string)
    }

    fn get_bool(&self, path: &str) -> Option<bool> {
        self.node(path)?.as_bool()
    }

    fn put_i64(&mut self, path: &str, value: i64) {
        self.put_value(path, Value::from(value));
    }

    fn put_f64(&mut self, path: &str, value: f64) {
        self.put_value(path, Value::from(value));
    }

    fn put_str(&mut self, path: &str, value: &str) {
        self.put_value(path, Value::from(value));
    }

    fn put_bool(&mut self, path: &str, value: bool) {
        self.put_value(path, Value::from(value));
    }
}
