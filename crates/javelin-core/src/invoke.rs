//! Invocation thunks and the per-class call table
//!
//! A thunk is the entry point the interpreter calls to start a method. It
//! does not run anything itself; it pushes frames and marks the thread
//! runnable so the scheduler picks them up.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Bytecode / Native frame      │  ← top: runs first
//! │   locals: [receiver, args…]  │
//! ├──────────────────────────────┤
//! │ Internal frame (optional)    │  ← receives the result
//! │   on_complete                │
//! ├──────────────────────────────┤
//! │ caller frames                │
//! └──────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use javelin_sdk::{JvmThread, ObjectRef, ThreadStatus, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::member::Member;
use crate::method::Method;

/// How a pushed method finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    /// Normal return; `None` for `void`
    Returned(Option<Value>),
    /// Uncaught exception
    Threw(ObjectRef),
}

/// Continuation run by an internal frame when the method below it finishes
pub type CompletionCallback = Box<dyn FnOnce(Completion) + Send>;

/// A frame pushed by a thunk
pub enum StackFrame {
    /// Interpret the method's bytecode
    Bytecode {
        /// Method to run
        method: Arc<Method>,
        /// Initial local-variable words
        locals: Vec<Value>,
    },
    /// Call the method's native implementation
    Native {
        /// Method to run
        method: Arc<Method>,
        /// Raw argument words; compacted by [`Method::invoke_native`]
        locals: Vec<Value>,
    },
    /// Hand the result of the frame above to host code
    Internal {
        /// Result continuation
        on_complete: CompletionCallback,
    },
}

impl StackFrame {
    /// Method of a bytecode or native frame
    pub fn method(&self) -> Option<&Arc<Method>> {
        match self {
            StackFrame::Bytecode { method, .. } | StackFrame::Native { method, .. } => Some(method),
            StackFrame::Internal { .. } => None,
        }
    }

    /// Initial locals of a bytecode or native frame
    pub fn locals(&self) -> &[Value] {
        match self {
            StackFrame::Bytecode { locals, .. } | StackFrame::Native { locals, .. } => locals,
            StackFrame::Internal { .. } => &[],
        }
    }
}

impl fmt::Debug for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackFrame::Bytecode { method, locals } => f
                .debug_struct("Bytecode")
                .field("method", &method.full_signature())
                .field("locals", locals)
                .finish(),
            StackFrame::Native { method, locals } => f
                .debug_struct("Native")
                .field("method", &method.full_signature())
                .field("locals", locals)
                .finish(),
            StackFrame::Internal { .. } => f.write_str("Internal"),
        }
    }
}

/// A guest thread the interpreter can push frames onto
pub trait InterpreterThread: JvmThread {
    /// Push a frame on top of the call stack
    fn push_frame(&mut self, frame: StackFrame);
}

/// Entry point installed for a method: `(thread, receiver, argument words,
/// completion)`. The receiver is ignored for static methods.
pub type Invoker = Arc<
    dyn Fn(&mut dyn InterpreterThread, Option<ObjectRef>, &[Value], Option<CompletionCallback>)
        + Send
        + Sync,
>;

impl Method {
    /// Synthesize the entry point for this method
    pub fn invoker(self: &Arc<Self>) -> Invoker {
        let method = Arc::clone(self);
        Arc::new(
            move |thread: &mut dyn InterpreterThread,
                  receiver: Option<ObjectRef>,
                  args: &[Value],
                  on_complete: Option<CompletionCallback>| {
                if let Some(on_complete) = on_complete {
                    thread.push_frame(StackFrame::Internal { on_complete });
                }

                let locals = if method.is_static() {
                    args.to_vec()
                } else {
                    let mut locals = Vec::with_capacity(args.len() + 1);
                    locals.push(receiver.map_or_else(Value::null, Value::object));
                    locals.extend_from_slice(args);
                    locals
                };

                trace!(
                    method = %method.full_signature(),
                    native = method.is_native(),
                    words = locals.len(),
                    "pushing frame"
                );

                let frame = if method.is_native() {
                    StackFrame::Native {
                        method: Arc::clone(&method),
                        locals,
                    }
                } else {
                    StackFrame::Bytecode {
                        method: Arc::clone(&method),
                        locals,
                    }
                };
                thread.push_frame(frame);
                thread.set_status(ThreadStatus::Runnable);
            },
        )
    }
}

/// A class's invocation entry points, keyed by both `name+descriptor`
/// and `<class>/name+descriptor`
pub struct CallTable {
    entries: RwLock<FxHashMap<String, Invoker>>,
}

impl CallTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Install the entry point for `method` under both keys
    pub fn install(&self, method: &Arc<Method>) {
        let invoker = method.invoker();
        let mut entries = self.entries.write();
        entries.insert(method.signature().to_string(), Arc::clone(&invoker));
        entries.insert(method.full_signature().to_string(), invoker);
    }

    /// Install entry points for every method of a class
    pub fn install_all<'a>(&self, methods: impl IntoIterator<Item = &'a Arc<Method>>) {
        for method in methods {
            self.install(method);
        }
    }

    /// Entry point by short or fully qualified signature
    pub fn get(&self, signature: &str) -> Option<Invoker> {
        self.entries.read().get(signature).cloned()
    }

    /// Check if an entry point is installed under `signature`
    pub fn contains(&self, signature: &str) -> bool {
        self.entries.read().contains_key(signature)
    }

    /// Number of keys (two per installed method)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All installed keys, sorted
    pub fn signatures(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for CallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTable")
            .field("entries", &self.len())
            .finish()
    }
}
