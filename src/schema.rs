//! Declarative validation of parsed JSON bodies.
//!
//! A [`Schema`] inspects a `serde_json::Value` and reports **every**
//! violation it finds, each as a [`FieldError`] with a human-readable
//! message and a dotted path. It never stops at the first problem.
//!
//! [`ObjectSchema`] covers the common case of an object with typed fields:
//!
//! ```rust
//! use strata::{Field, ObjectSchema, Schema};
//! use serde_json::json;
//!
//! let schema = ObjectSchema::new()
//!     .field("first", Field::string().min_len(1).required())
//!     .field("last", Field::string().required());
//!
//! let errors = schema.validate(&json!({ "first": 7 }));
//! assert_eq!(errors.len(), 2);
//! assert_eq!(errors[0].msg, r#""first" must be a string"#);
//! assert_eq!(errors[1].msg, r#""last" is required"#);
//! ```
//!
//! Any `Fn(&Value) -> Vec<FieldError>` is a schema too, for rules that do
//! not fit the declarative form.

use serde::Serialize;
use serde_json::{Map, Value};

/// One violation: what is wrong, and where.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    pub msg: String,
    pub path: String,
}

impl FieldError {
    pub fn new(msg: impl Into<String>, path: impl Into<String>) -> Self {
        Self { msg: msg.into(), path: path.into() }
    }
}

/// Validates a parsed JSON value. An empty result means valid.
pub trait Schema: Send + Sync + 'static {
    fn validate(&self, value: &Value) -> Vec<FieldError>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Vec<FieldError> + Send + Sync + 'static,
{
    fn validate(&self, value: &Value) -> Vec<FieldError> {
        self(value)
    }
}

// ── Field ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Kind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Object(ObjectSchema),
    Array(Box<Field>),
}

/// Rules for a single value.
#[derive(Clone, Debug)]
pub struct Field {
    kind: Kind,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Field {
    fn of(kind: Kind) -> Self {
        Self { kind, required: false, min_len: None, max_len: None, min: None, max: None }
    }

    pub fn any() -> Self { Self::of(Kind::Any) }
    pub fn string() -> Self { Self::of(Kind::String) }
    pub fn number() -> Self { Self::of(Kind::Number) }
    pub fn integer() -> Self { Self::of(Kind::Integer) }
    pub fn boolean() -> Self { Self::of(Kind::Boolean) }
    pub fn object(schema: ObjectSchema) -> Self { Self::of(Kind::Object(schema)) }

    /// An array whose items all follow `item`.
    pub fn array(item: Field) -> Self { Self::of(Kind::Array(Box::new(item))) }

    /// The key must be present. A present `null` is checked against the
    /// field's type like any other value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Minimum length, in UTF-16 units for strings and items for arrays.
    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    /// Maximum length, in UTF-16 units for strings and items for arrays.
    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    /// Inclusive lower bound for numbers.
    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    /// Inclusive upper bound for numbers.
    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    fn check(&self, value: &Value, path: &str, out: &mut Vec<FieldError>) {
        let label = label(path);
        match (&self.kind, value) {
            (Kind::Any, _) => {}
            (Kind::String, Value::String(s)) => {
                self.check_len(s.encode_utf16().count(), path, out);
            }
            (Kind::String, _) => out.push(FieldError::new(format!("{label} must be a string"), path)),
            (Kind::Number, Value::Number(n)) => {
                if let Some(n) = n.as_f64() {
                    self.check_bounds(n, path, out);
                }
            }
            (Kind::Number, _) => out.push(FieldError::new(format!("{label} must be a number"), path)),
            (Kind::Integer, Value::Number(n)) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => self.check_bounds(f, path, out),
                _ => out.push(FieldError::new(format!("{label} must be an integer"), path)),
            },
            (Kind::Integer, _) => out.push(FieldError::new(format!("{label} must be a number"), path)),
            (Kind::Boolean, Value::Bool(_)) => {}
            (Kind::Boolean, _) => out.push(FieldError::new(format!("{label} must be a boolean"), path)),
            (Kind::Object(schema), Value::Object(map)) => schema.check_map(map, path, out),
            (Kind::Object(_), _) => {
                out.push(FieldError::new(format!("{label} must be of type object"), path));
            }
            (Kind::Array(item), Value::Array(items)) => {
                self.check_items(items.len(), path, out);
                for (i, v) in items.iter().enumerate() {
                    item.check(v, &join(path, &i.to_string()), out);
                }
            }
            (Kind::Array(_), _) => out.push(FieldError::new(format!("{label} must be an array"), path)),
        }
    }

    fn check_len(&self, len: usize, path: &str, out: &mut Vec<FieldError>) {
        let label = label(path);
        if let Some(min) = self.min_len.filter(|&m| len < m) {
            out.push(FieldError::new(format!("{label} length must be at least {min} characters long"), path));
        }
        if let Some(max) = self.max_len.filter(|&m| len > m) {
            out.push(FieldError::new(
                format!("{label} length must be less than or equal to {max} characters long"),
                path,
            ));
        }
    }

    fn check_items(&self, len: usize, path: &str, out: &mut Vec<FieldError>) {
        let label = label(path);
        if let Some(min) = self.min_len.filter(|&m| len < m) {
            out.push(FieldError::new(format!("{label} must contain at least {min} items"), path));
        }
        if let Some(max) = self.max_len.filter(|&m| len > m) {
            out.push(FieldError::new(
                format!("{label} must contain less than or equal to {max} items"),
                path,
            ));
        }
    }

    fn check_bounds(&self, n: f64, path: &str, out: &mut Vec<FieldError>) {
        let label = label(path);
        if let Some(min) = self.min.filter(|&m| n < m) {
            out.push(FieldError::new(format!("{label} must be greater than or equal to {min}"), path));
        }
        if let Some(max) = self.max.filter(|&m| n > m) {
            out.push(FieldError::new(format!("{label} must be less than or equal to {max}"), path));
        }
    }
}

// ── ObjectSchema ─────────────────────────────────────────────────────────────

/// An object with named, typed fields. Keys not declared are rejected unless
/// [`allow_unknown`](ObjectSchema::allow_unknown) is set.
#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Field)>,
    allow_unknown: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Fields are checked in declaration order.
    pub fn field(mut self, name: impl Into<String>, rules: Field) -> Self {
        self.fields.push((name.into(), rules));
        self
    }

    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    fn check_map(&self, map: &Map<String, Value>, prefix: &str, out: &mut Vec<FieldError>) {
        for (name, rules) in &self.fields {
            let path = join(prefix, name);
            match map.get(name) {
                None if rules.required => {
                    out.push(FieldError::new(format!("{} is required", label(&path)), path));
                }
                None => {}
                Some(v) => rules.check(v, &path, out),
            }
        }
        if !self.allow_unknown {
            for key in map.keys() {
                if !self.fields.iter().any(|(name, _)| name == key) {
                    let path = join(prefix, key);
                    out.push(FieldError::new(format!("{} is not allowed", label(&path)), path));
                }
            }
        }
    }
}

impl Schema for ObjectSchema {
    fn validate(&self, value: &Value) -> Vec<FieldError> {
        let mut out = Vec::new();
        match value {
            Value::Object(map) => self.check_map(map, "", &mut out),
            _ => out.push(FieldError::new(r#""value" must be of type object"#, "")),
        }
        out
    }
}

// ── Paths ────────────────────────────────────────────────────────────────────

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() { key.to_owned() } else { format!("{prefix}.{key}") }
}

/// The quoted label used in messages; the root value is `"value"`.
fn label(path: &str) -> String {
    if path.is_empty() { r#""value""#.to_owned() } else { format!("\"{path}\"") }
}
