//! Native method functions and the name-keyed native registry
//!
//! Native libraries register implementations keyed by the owning class's
//! internal name and the method signature (name + descriptor). The VM
//! looks them up lazily the first time a native method is invoked, so
//! registration may happen before or after the class is loaded.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{AbiResult, NativeError};
use crate::thread::JvmThread;
use crate::value::Value;

// ============================================================================
// NativeCallResult
// ============================================================================

/// Result of a native method call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeCallResult {
    /// Call returned a value
    Value(Value),
    /// Call returned `void`
    Void,
    /// Call raised a guest exception on the thread; no value is produced
    Thrown,
}

impl NativeCallResult {
    /// Create a successful result with null value
    #[inline]
    pub fn null() -> Self {
        Self::Value(Value::null())
    }

    /// Create a successful result with an int value
    #[inline]
    pub fn int(val: i32) -> Self {
        Self::Value(Value::int(val))
    }

    /// Create a successful result with a boolean value
    #[inline]
    pub fn bool(val: bool) -> Self {
        Self::Value(Value::bool(val))
    }

    /// Create a successful result with a long value
    #[inline]
    pub fn long(val: i64) -> Self {
        Self::Value(Value::long(val))
    }

    /// Returned value, if any
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Check if the call raised a guest exception
    pub fn is_thrown(&self) -> bool {
        matches!(self, Self::Thrown)
    }
}

/// A native method implementation.
///
/// Receives the calling thread followed by the compacted arguments: the
/// receiver first for instance methods, then one entry per declared
/// parameter. Wide values are not followed by a placeholder.
pub type NativeFn = Arc<dyn Fn(&mut dyn JvmThread, &[Value]) -> NativeCallResult + Send + Sync>;

/// Wrap a closure as a [`NativeFn`]
pub fn native_fn(
    f: impl Fn(&mut dyn JvmThread, &[Value]) -> NativeCallResult + Send + Sync + 'static,
) -> NativeFn {
    Arc::new(f)
}

// ============================================================================
// Native Library
// ============================================================================

/// A group of native methods belonging to one class.
///
/// Built by a native library author, then handed to
/// [`NativeRegistry::register_library`].
pub struct NativeLibrary {
    class_name: String,
    methods: HashMap<String, NativeFn>,
}

impl NativeLibrary {
    /// Create a library for the class with the given internal name
    /// (e.g. `java/lang/Object`)
    pub fn new(class_name: impl Into<String>) -> Self {
        NativeLibrary {
            class_name: class_name.into(),
            methods: HashMap::new(),
        }
    }

    /// Register an implementation for `signature` (e.g. `hashCode()I`)
    pub fn register(
        &mut self,
        signature: impl Into<String>,
        f: impl Fn(&mut dyn JvmThread, &[Value]) -> NativeCallResult + Send + Sync + 'static,
    ) -> &mut Self {
        self.methods.insert(signature.into(), Arc::new(f));
        self
    }

    /// Internal name of the class this library implements
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Number of registered methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// All registered signatures
    pub fn signatures(&self) -> Vec<&str> {
        self.methods.keys().map(|s| s.as_str()).collect()
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("class_name", &self.class_name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

// ============================================================================
// Native Registry
// ============================================================================

/// Registry of native method implementations keyed by
/// (class internal name, method signature).
///
/// Owned by a VM instance. Registration takes `&self` so libraries can be
/// added while classes referencing them are already linked.
pub struct NativeRegistry {
    natives: DashMap<(String, String), NativeFn>,
}

impl NativeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            natives: DashMap::new(),
        }
    }

    /// Register a native implementation, replacing any previous one
    pub fn register(
        &self,
        class_name: &str,
        signature: &str,
        f: impl Fn(&mut dyn JvmThread, &[Value]) -> NativeCallResult + Send + Sync + 'static,
    ) {
        self.insert(class_name, signature, Arc::new(f));
    }

    /// Register an already-wrapped native implementation
    pub fn insert(&self, class_name: &str, signature: &str, f: NativeFn) {
        tracing::trace!(class = class_name, signature, "registering native method");
        self.natives
            .insert((class_name.to_string(), signature.to_string()), f);
    }

    /// Register every method of a library.
    ///
    /// Fails without registering anything if any signature is already
    /// present for that class.
    pub fn register_library(&self, library: NativeLibrary) -> AbiResult<()> {
        let NativeLibrary {
            class_name,
            methods,
        } = library;

        if let Some(signature) = methods
            .keys()
            .find(|sig| self.contains(&class_name, sig))
        {
            return Err(NativeError::DuplicateNative {
                class: class_name.clone(),
                signature: signature.clone(),
            });
        }

        for (signature, f) in methods {
            self.insert(&class_name, &signature, f);
        }
        Ok(())
    }

    /// Look up an implementation
    pub fn lookup(&self, class_name: &str, signature: &str) -> Option<NativeFn> {
        self.natives
            .get(&(class_name.to_string(), signature.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Check if an implementation is registered
    pub fn contains(&self, class_name: &str, signature: &str) -> bool {
        self.natives
            .contains_key(&(class_name.to_string(), signature.to_string()))
    }

    /// Get the number of registered implementations
    pub fn len(&self) -> usize {
        self.natives.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRegistry")
            .field("count", &self.natives.len())
            .finish()
    }
}
