// The host function registry. A host registers named callbacks before
// parsing; the parser resolves call-site identifiers against the
// registry and bakes a shared Rc<FunctionEntry> into the AST, so the
// registry itself need not outlive the parse.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Ast;

pub struct FunctionEntry {
    pub name: String,
    callback: Box<dyn Fn(&[Ast], &mut [u8]) -> f32>,
    cleanup: Option<Box<dyn Fn(&mut [u8])>>,
    pub context_size: usize,
}

impl FunctionEntry {
    pub fn new(
        name: impl Into<String>,
        context_size: usize,
        callback: impl Fn(&[Ast], &mut [u8]) -> f32 + 'static,
    ) -> Self {
        FunctionEntry {
            name: name.into(),
            callback: Box::new(callback),
            cleanup: None,
            context_size,
        }
    }

    pub fn with_cleanup(mut self, cleanup: impl Fn(&mut [u8]) + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    // Invoked with the unevaluated argument ASTs; the host function
    // decides for itself which arguments to evaluate, how many times,
    // and in what order.
    pub fn call(&self, args: &[Ast], context: &mut [u8]) -> f32 {
        (self.callback)(args, context)
    }

    pub(crate) fn run_cleanup(&self, context: &mut [u8]) {
        if let Some(cleanup) = &self.cleanup {
            cleanup(context);
        }
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("name", &self.name)
            .field("context_size", &self.context_size)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct FunctionRegistry {
    entries: HashMap<String, Rc<FunctionEntry>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: FunctionEntry) {
        self.entries.insert(entry.name.clone(), Rc::new(entry));
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<FunctionEntry>> {
        self.entries.get(name).cloned()
    }
}
