//! Builtin override table
//!
//! Some library methods are replaced by VM-supplied implementations no
//! matter what the class file says: static initializers that would start
//! helper threads, capability checks, and `System.loadLibrary`. The table
//! is keyed by (owning class internal name, signature) and consulted once,
//! when the method is constructed.

use std::sync::Arc;

use javelin_sdk::{
    native_fn, FromValue, IntoValue, JvmThread, NativeCallResult, NativeFn, ObjectRef, Value,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::native::UNSATISFIED_LINK_ERROR;
use crate::options::LinkOptions;

/// Class names the stock overrides apply to
pub mod class {
    /// `java.lang.ref.Reference`
    pub const REFERENCE: &str = "java/lang/ref/Reference";
    /// `java.lang.ref.Finalizer`
    pub const FINALIZER: &str = "java/lang/ref/Finalizer";
    /// `java.lang.Terminator`
    pub const TERMINATOR: &str = "java/lang/Terminator";
    /// `java.util.concurrent.atomic.AtomicLong`
    pub const ATOMIC_LONG: &str = "java/util/concurrent/atomic/AtomicLong";
    /// Anonymous privileged action inside `java.nio.charset.Charset`
    pub const CHARSET_ACTION: &str = "java/nio/charset/Charset$3";
    /// `java.lang.System`
    pub const SYSTEM: &str = "java/lang/System";
}

const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";
const ILLEGAL_ARGUMENT_EXCEPTION: &str = "java/lang/IllegalArgumentException";

/// VM-owned override functions keyed by (class internal name, signature)
pub struct BuiltinTable {
    entries: RwLock<FxHashMap<(String, String), NativeFn>>,
}

impl BuiltinTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create a table holding the stock overrides
    pub fn with_defaults(options: &LinkOptions) -> Self {
        let table = Self::new();

        // Static initializers that would spawn reference-handler and
        // finalizer threads.
        table.register(class::REFERENCE, "<clinit>()V", |_t, _args| {
            NativeCallResult::Void
        });
        table.register(class::FINALIZER, "<clinit>()V", |_t, _args| {
            NativeCallResult::Void
        });
        // Signal handler installation
        table.register(class::TERMINATOR, "setup()V", |_t, _args| {
            NativeCallResult::Void
        });
        // One logical thread runs guest code, so 8-byte compare-and-set is
        // always available.
        table.register(class::ATOMIC_LONG, "VMSupportsCS8()Z", |_t, _args| {
            NativeCallResult::Value(true.into_value())
        });
        // Provider lookup through the service loader
        table.register(class::CHARSET_ACTION, "run()Ljava/lang/Object;", |_t, _args| {
            NativeCallResult::null()
        });

        let libraries: Arc<[String]> = options.builtin_libraries.iter().cloned().collect();
        table.register(
            class::SYSTEM,
            "loadLibrary(Ljava/lang/String;)V",
            move |thread, args| load_library(thread, args, &libraries),
        );

        table
    }

    /// Install or replace an override
    pub fn register(
        &self,
        class_name: impl Into<String>,
        signature: impl Into<String>,
        f: impl Fn(&mut dyn JvmThread, &[Value]) -> NativeCallResult + Send + Sync + 'static,
    ) {
        self.insert(class_name, signature, native_fn(f));
    }

    /// Install or replace an override from an existing [`NativeFn`]
    pub fn insert(&self, class_name: impl Into<String>, signature: impl Into<String>, f: NativeFn) {
        let key = (class_name.into(), signature.into());
        debug!(class = %key.0, signature = %key.1, "builtin override installed");
        self.entries.write().insert(key, f);
    }

    /// Look up the override for a member
    pub fn lookup(&self, class_name: &str, signature: &str) -> Option<NativeFn> {
        self.entries
            .read()
            .get(&(class_name.to_string(), signature.to_string()))
            .cloned()
    }

    /// Whether an override exists for a member
    pub fn contains(&self, class_name: &str, signature: &str) -> bool {
        self.lookup(class_name, signature).is_some()
    }

    /// Number of overrides
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuiltinTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinTable")
            .field("entries", &self.len())
            .finish()
    }
}

/// `System.loadLibrary`: libraries the VM provides itself load trivially,
/// anything else raises `UnsatisfiedLinkError`
fn load_library(thread: &mut dyn JvmThread, args: &[Value], libraries: &[String]) -> NativeCallResult {
    let arg = args.first().copied().unwrap_or_default();
    let name_ref = match Option::<ObjectRef>::from_value(arg) {
        Ok(Some(obj)) => obj,
        Ok(None) => {
            thread.throw_new_exception(NULL_POINTER_EXCEPTION, "library name is null");
            return NativeCallResult::Thrown;
        }
        Err(e) => {
            thread.throw_new_exception(ILLEGAL_ARGUMENT_EXCEPTION, &e.to_string());
            return NativeCallResult::Thrown;
        }
    };

    let name = match thread.read_string(Value::object(name_ref)) {
        Ok(name) => name,
        Err(e) => {
            thread.throw_new_exception(NULL_POINTER_EXCEPTION, &e.to_string());
            return NativeCallResult::Thrown;
        }
    };

    if libraries.iter().any(|lib| *lib == name) {
        debug!(library = %name, "loadLibrary satisfied by builtin");
        NativeCallResult::Void
    } else {
        thread.throw_new_exception(
            UNSATISFIED_LINK_ERROR,
            &format!("no {} in java.library.path", name),
        );
        NativeCallResult::Thrown
    }
}
