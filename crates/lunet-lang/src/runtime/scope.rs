//! Variable storage and the activation stack.
//!
//! There are no closures. A name resolves by walking frames from the top of
//! the stack down to the nearest call frame (loop frames are transparent to
//! the function that owns them), then falling back to globals.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::InterpreterConfig;
use crate::error::RuntimeError;
use crate::runtime::value::Value;
use crate::syntax::ast::{FunctionDef, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    Call { function: String },
    Loop { keyword: &'static str },
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    vars: FxHashMap<String, Value>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self { kind, vars: FxHashMap::default() }
    }

    fn is_call(&self) -> bool {
        matches!(self.kind, FrameKind::Call { .. })
    }
}

#[derive(Debug)]
pub struct Scope {
    globals: FxHashMap<String, Value>,
    functions: FxHashMap<String, Rc<FunctionDef>>,
    frames: Vec<Frame>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Scope {
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            globals: FxHashMap::default(),
            functions: FxHashMap::default(),
            frames: Vec::new(),
            call_depth: 0,
            max_call_depth: config.max_call_depth,
        }
    }

    // ─── Variables ───────────────────────────────────────────────────────────

    /// Index of the visible frame that binds `name`, if any.
    fn owner(&self, name: &str) -> Option<usize> {
        for (i, frame) in self.frames.iter().enumerate().rev() {
            if frame.vars.contains_key(name) { return Some(i); }
            if frame.is_call() { break; }
        }
        None
    }

    fn lookup(&self, name: &str) -> Value {
        match self.owner(name) {
            Some(i) => self.frames[i].vars.get(name).cloned().unwrap_or_default(),
            None => self.globals.get(name).cloned().unwrap_or_default(),
        }
    }

    /// Read `name` followed by `path`. Indexing through nil yields nil.
    pub fn read(&self, name: &str, path: &[Value], span: &Span) -> Result<Value, RuntimeError> {
        let mut current = self.lookup(name);
        for (i, key) in path.iter().enumerate() {
            current = match current {
                Value::Table(t) => t.get(key),
                Value::Nil => return Ok(Value::Nil),
                other => return Err(RuntimeError::type_error(
                    span,
                    format!("attempt to index a {} value (`{}`)", other.type_name(), path_text(name, &path[..i])),
                )),
            };
        }
        Ok(current)
    }

    /// `local name = value`: bind in the innermost frame, or globally at top level.
    pub fn declare(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => { frame.vars.insert(name.to_string(), value); }
            None => { self.globals.insert(name.to_string(), value); }
        }
    }

    /// Non-local assignment. Updates the owning frame when one is visible,
    /// otherwise the global; with a path, stores into the table it reaches.
    pub fn assign(&mut self, name: &str, path: &[Value], value: Value, span: &Span) -> Result<(), RuntimeError> {
        let Some((last, init)) = path.split_last() else {
            match self.owner(name) {
                Some(i) => { self.frames[i].vars.insert(name.to_string(), value); }
                None => { self.globals.insert(name.to_string(), value); }
            }
            return Ok(());
        };

        let mut current = self.lookup(name);
        for (i, key) in init.iter().enumerate() {
            current = match current {
                Value::Table(t) => t.get(key),
                other => return Err(not_indexable(&other, name, &path[..i], span)),
            };
        }
        match current {
            Value::Table(t) => t.set(last.clone(), value)
                .map_err(|e| RuntimeError::type_error(span, e.to_string())),
            other => Err(not_indexable(&other, name, init, span)),
        }
    }

    // ─── Frames ──────────────────────────────────────────────────────────────

    /// Push a call frame with `args` bound to the parameters. Missing
    /// arguments are nil; extras are dropped.
    pub fn push_call(&mut self, def: &FunctionDef, args: Vec<Value>, span: &Span) -> Result<(), RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::recursion(
                span,
                format!("stack overflow: more than {} nested calls (in `{}`)", self.max_call_depth, def.name),
            ));
        }
        let mut frame = Frame::new(FrameKind::Call { function: def.name.clone() });
        let mut args = args.into_iter();
        for param in &def.params {
            frame.vars.insert(param.clone(), args.next().unwrap_or_default());
        }
        self.frames.push(frame);
        self.call_depth += 1;
        trace!(function = %def.name, depth = self.call_depth, "push call frame");
        Ok(())
    }

    pub fn pop_call(&mut self) {
        if let Some(frame) = self.frames.pop() {
            debug_assert!(frame.is_call(), "unbalanced frames: expected call, got {:?}", frame.kind);
            self.call_depth = self.call_depth.saturating_sub(1);
            trace!(kind = ?frame.kind, depth = self.call_depth, "pop call frame");
        }
    }

    pub fn push_loop(&mut self, keyword: &'static str) {
        self.frames.push(Frame::new(FrameKind::Loop { keyword }));
        trace!(keyword, frames = self.frames.len(), "push loop frame");
    }

    pub fn pop_loop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            debug_assert!(!frame.is_call(), "unbalanced frames: expected loop, got {:?}", frame.kind);
            trace!(kind = ?frame.kind, frames = self.frames.len(), "pop loop frame");
        }
    }

    /// Total number of frames on the stack.
    pub fn depth(&self) -> usize { self.frames.len() }

    /// Number of call frames on the stack.
    pub fn call_depth(&self) -> usize { self.call_depth }

    /// Kind of the innermost frame, if any.
    pub fn top_frame(&self) -> Option<&FrameKind> {
        self.frames.last().map(|f| &f.kind)
    }

    // ─── Functions ───────────────────────────────────────────────────────────

    pub fn define_function(&mut self, def: Rc<FunctionDef>) {
        self.functions.insert(def.name.clone(), def);
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.functions.get(name).cloned()
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}

fn not_indexable(value: &Value, name: &str, path: &[Value], span: &Span) -> RuntimeError {
    let target = path_text(name, path);
    match value {
        Value::Nil => RuntimeError::type_error(span, format!("cannot index nil (`{target}`)")),
        other => RuntimeError::type_error(
            span,
            format!("cannot index a {} value (`{target}`)", other.type_name()),
        ),
    }
}

/// Source-like rendering of a variable and index path: `t.a[1]`.
fn path_text(name: &str, path: &[Value]) -> String {
    let mut text = name.to_string();
    for key in path {
        match key {
            Value::String(s) if is_identifier(s) => { text.push('.'); text.push_str(s); }
            Value::String(s) => text.push_str(&format!("[\"{s}\"]")),
            other => text.push_str(&format!("[{other}]")),
        }
    }
    text
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
