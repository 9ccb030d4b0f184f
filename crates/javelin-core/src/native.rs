//! Native resolution engine
//!
//! Every method's code is picked once, at construction:
//!
//! 1. a builtin override registered for (class, signature)
//! 2. a permanent no-op for `registerNatives()V` / `initIDs()V`
//! 3. an unresolved native, bound against the native registry on first call
//! 4. the bytecode of the `Code` attribute
//! 5. nothing, for abstract methods
//!
//! Only the unresolved native changes afterwards, and only once: the first
//! successful registry lookup is stored in a `OnceCell` and reused for every
//! later call. A failed lookup stores nothing so the next call retries.

use std::fmt;
use std::sync::Arc;

use javelin_sdk::{native_fn, NativeCallResult, NativeFn, NativeRegistry};
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::attributes::CodeAttribute;

/// Guest exception raised when a native implementation cannot be found
pub const UNSATISFIED_LINK_ERROR: &str = "java/lang/UnsatisfiedLinkError";

/// Signatures of native init hooks that get a permanent no-op
pub const INIT_HOOK_SIGNATURES: &[&str] = &["registerNatives()V", "initIDs()V"];

static NOOP: Lazy<NativeFn> = Lazy::new(|| native_fn(|_thread, _args| NativeCallResult::Void));

/// The code governing a method's execution
pub enum MethodCode {
    /// Bytecode body
    Bytecode(Arc<CodeAttribute>),
    /// VM-supplied builtin override
    Trapped(NativeFn),
    /// No-op init hook
    Stub,
    /// Native method bound lazily against `registry`
    Native {
        /// Registry consulted on first invocation
        registry: Arc<NativeRegistry>,
        /// Implementation found by the first successful lookup
        resolved: OnceCell<NativeFn>,
    },
    /// Abstract method; there is nothing to run
    Abstract,
}

/// Observable resolution state of a method's code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeState {
    /// Runs bytecode
    Bytecode,
    /// Runs a builtin override
    Trapped,
    /// Runs the no-op init hook
    Stub,
    /// Native, not yet bound
    UnresolvedNative,
    /// Native, bound to a registered implementation
    ResolvedNative,
    /// Abstract
    Abstract,
}

impl MethodCode {
    /// Fresh unresolved native code backed by `registry`
    pub fn unresolved(registry: Arc<NativeRegistry>) -> Self {
        MethodCode::Native {
            registry,
            resolved: OnceCell::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> CodeState {
        match self {
            MethodCode::Bytecode(_) => CodeState::Bytecode,
            MethodCode::Trapped(_) => CodeState::Trapped,
            MethodCode::Stub => CodeState::Stub,
            MethodCode::Native { resolved, .. } => {
                if resolved.get().is_some() {
                    CodeState::ResolvedNative
                } else {
                    CodeState::UnresolvedNative
                }
            }
            MethodCode::Abstract => CodeState::Abstract,
        }
    }

    /// Whether this code is implemented outside bytecode
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            MethodCode::Trapped(_) | MethodCode::Stub | MethodCode::Native { .. }
        )
    }

    /// The native function to call, binding it on first use.
    ///
    /// Returns `None` for bytecode and abstract code, and for a native the
    /// registry does not know yet.
    pub(crate) fn native_function(&self, class_name: &str, signature: &str) -> Option<NativeFn> {
        match self {
            MethodCode::Trapped(f) => Some(f.clone()),
            MethodCode::Stub => Some(NOOP.clone()),
            MethodCode::Native { registry, resolved } => resolved
                .get_or_try_init(|| {
                    registry.lookup(class_name, signature).ok_or(()).map(|f| {
                        debug!(class = class_name, signature, "native method resolved");
                        f
                    })
                })
                .ok()
                .cloned(),
            MethodCode::Bytecode(_) | MethodCode::Abstract => None,
        }
    }
}

impl fmt::Debug for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodCode::Bytecode(code) => f
                .debug_struct("Bytecode")
                .field("max_stack", &code.max_stack)
                .field("max_locals", &code.max_locals)
                .field("len", &code.code.len())
                .finish(),
            MethodCode::Trapped(_) => f.write_str("Trapped"),
            MethodCode::Stub => f.write_str("Stub"),
            MethodCode::Native { resolved, .. } => f
                .debug_struct("Native")
                .field("resolved", &resolved.get().is_some())
                .finish(),
            MethodCode::Abstract => f.write_str("Abstract"),
        }
    }
}
