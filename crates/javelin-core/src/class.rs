//! Declaring-class handles shared by members

use std::fmt;
use std::sync::Arc;

use javelin_sdk::ObjectRef;

/// Shared reference to a loaded class
pub type ClassRef = Arc<ClassHandle>;

/// The parts of a loaded class that members and reflection need.
///
/// The class loader owns the full class; members hold a `ClassRef` for the
/// lifetime of their declaring class.
pub struct ClassHandle {
    /// Internal name (`java/lang/String`, `[I`, or a primitive descriptor letter)
    name: String,
    /// The reflective `java.lang.Class` mirror; its monitor guards static
    /// synchronized methods
    class_object: ObjectRef,
}

impl ClassHandle {
    /// Create a shared handle
    pub fn new(name: impl Into<String>, class_object: ObjectRef) -> ClassRef {
        Arc::new(Self {
            name: name.into(),
            class_object,
        })
    }

    /// Internal name of the class
    pub fn internal_name(&self) -> &str {
        &self.name
    }

    /// The class's reflective mirror object
    pub fn class_object(&self) -> ObjectRef {
        self.class_object
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHandle")
            .field("name", &self.name)
            .field("class_object", &self.class_object)
            .finish()
    }
}
