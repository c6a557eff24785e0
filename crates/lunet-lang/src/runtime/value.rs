//! Runtime values.
//!
//! Equality and ordering follow the language rules, not Rust's structural
//! ones: values of different kinds compare through their string forms.

use std::borrow::Cow;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Table(Table),
    /// Result of a comma-separated expression list: several return values or arguments.
    List(Vec<Value>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil        => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_)   => "float",
            Value::String(_)  => "string",
            Value::Table(_)   => "table",
            Value::List(_)    => "list",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Collapse an evaluated expression list: one value stays itself, any other count is a `List`.
    pub fn from_values(mut values: Vec<Value>) -> Value {
        if values.len() == 1 { values.swap_remove(0) } else { Value::List(values) }
    }

    /// Spread a `List` back into its elements; any other value is a single element.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Value::List(values) => values,
            other => vec![other],
        }
    }

    /// First value of a `List` (or `Nil` if empty); any other value is returned unchanged.
    pub fn first(self) -> Value {
        match self {
            Value::List(values) => values.into_iter().next().unwrap_or_default(),
            other => other,
        }
    }

    /// Language equality. `Nil` equals only `Nil`; same-kind scalars compare by
    /// value; everything else compares string forms.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            (a, b) => a.to_string() == b.to_string(),
        }
    }

    /// Language ordering. Integers and floats compare numerically with each
    /// other; mismatched kinds fall back to comparing string forms. `None`
    /// only when a NaN is involved.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => Some(a.to_string().cmp(&b.to_string())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil        => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x)   => f.write_str(&format_float(*x)),
            Value::String(s)  => f.write_str(s),
            Value::Table(t)   => write!(f, "table: {:#x}", t.id()),
            Value::List(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 { f.write_str("\t")?; }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Integer(i) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.into()) }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self { Value::Table(t) }
}

/// Canonical float text: always distinguishable from an integer, and parses back
/// to the same `f64`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-5..1e16).contains(&magnitude) {
        format!("{x:e}")
    } else if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Shared, mutable key/value map. Cloning a `Table` clones the handle, so every
/// clone sees the same entries.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<IndexMap<TableKey, Value>>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidKey {
    #[error("table index is nil")]
    Nil,
    #[error("table index is NaN")]
    NaN,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Value {
        self.0.borrow().get(&TableKey(key.clone())).cloned().unwrap_or_default()
    }

    /// Insert or overwrite. Storing `Nil` removes the entry.
    pub fn set(&self, key: Value, value: Value) -> Result<(), InvalidKey> {
        match &key {
            Value::Nil => return Err(InvalidKey::Nil),
            Value::Float(x) if x.is_nan() => return Err(InvalidKey::NaN),
            _ => {}
        }
        let mut entries = self.0.borrow_mut();
        if value.is_nil() {
            entries.shift_remove(&TableKey(key));
        } else {
            entries.insert(TableKey(key), value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.borrow().iter().map(|(k, v)| (k.0.clone(), v.clone())).collect()
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared map; stable for the table's lifetime.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // entries are not printed: a table may contain itself
        write!(f, "Table({:#x}, {} entries)", self.id(), self.len())
    }
}

/// Map key wrapper. Equal keys must hash alike, and equality falls back to
/// string forms, so the hash is taken over the string form.
#[derive(Debug, Clone)]
struct TableKey(Value);

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.equals(&other.0)
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let form = match &self.0 {
            Value::String(s) => Cow::Borrowed(&**s),
            other => Cow::Owned(other.to_string()),
        };
        // -0.0 equals both 0.0 and "-0.0", so both zero forms share a hash
        let form = if form == "-0.0" { "0.0" } else { &*form };
        form.hash(state);
    }
}
