//! Reflection objects for fields, methods and constructors
//!
//! A reflection view refers to every type its member mentions as a loaded
//! class, so building one waits on the class loader. The request is issued
//! once and the view is handed to a boxed continuation when the loader
//! answers. If any type fails to load the continuation gets `None`.

use std::sync::Arc;

use javelin_sdk::JvmThread;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::class::ClassRef;
use crate::descriptor::class_name_to_descriptor;
use crate::field::Field;
use crate::member::Member;
use crate::method::Method;

/// Continuation for a single class resolution
pub type ResolveCallback = Box<dyn FnOnce(Option<ClassRef>) + Send>;

/// Continuation for a batch resolution; receives descriptor → class for
/// every requested descriptor, or `None` if any failed
pub type BatchResolveCallback = Box<dyn FnOnce(Option<FxHashMap<String, ClassRef>>) + Send>;

/// Continuation receiving a finished reflection object
pub type ReflectCallback = Box<dyn FnOnce(Option<Reflection>) + Send>;

/// Class resolution as seen from reflection.
///
/// Implementations may answer synchronously or later; either way each
/// callback runs exactly once.
pub trait ClassLoader: Send + Sync {
    /// Resolve the class named by a field descriptor (`I`, `[J`,
    /// `Ljava/lang/String;`)
    fn resolve_class(&self, thread: &mut dyn JvmThread, descriptor: &str, callback: ResolveCallback);

    /// Resolve several classes at once
    fn resolve_classes(
        &self,
        thread: &mut dyn JvmThread,
        descriptors: &[String],
        callback: BatchResolveCallback,
    );
}

/// `java.lang.reflect.Field` contents
#[derive(Debug, Clone)]
pub struct FieldReflection {
    /// Declaring class
    pub declaring_class: ClassRef,
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: ClassRef,
    /// Access flags as reported by `getModifiers`
    pub modifiers: u16,
    /// Slot in the declaring class
    pub slot: i32,
    /// Generic signature
    pub signature: Option<String>,
    /// Raw `RuntimeVisibleAnnotations`
    pub annotations: Option<Arc<[u8]>>,
}

/// `java.lang.reflect.Method` contents
#[derive(Debug, Clone)]
pub struct MethodReflection {
    /// Declaring class
    pub declaring_class: ClassRef,
    /// Method name
    pub name: String,
    /// Parameter types, in order
    pub parameter_types: Vec<ClassRef>,
    /// Return type (`void` resolves to the primitive void class)
    pub return_type: ClassRef,
    /// Declared checked exceptions
    pub exception_types: Vec<ClassRef>,
    /// Access flags as reported by `getModifiers`
    pub modifiers: u16,
    /// Slot in the declaring class
    pub slot: i32,
    /// Generic signature
    pub signature: Option<String>,
    /// Raw `RuntimeVisibleAnnotations`
    pub annotations: Option<Arc<[u8]>>,
    /// Raw `RuntimeVisibleParameterAnnotations`
    pub parameter_annotations: Option<Arc<[u8]>>,
    /// Raw `AnnotationDefault`
    pub annotation_default: Option<Arc<[u8]>>,
}

/// `java.lang.reflect.Constructor` contents
#[derive(Debug, Clone)]
pub struct ConstructorReflection {
    /// Declaring class
    pub declaring_class: ClassRef,
    /// Parameter types, in order
    pub parameter_types: Vec<ClassRef>,
    /// Declared checked exceptions
    pub exception_types: Vec<ClassRef>,
    /// Access flags as reported by `getModifiers`
    pub modifiers: u16,
    /// Slot in the declaring class
    pub slot: i32,
    /// Generic signature
    pub signature: Option<String>,
    /// Raw `RuntimeVisibleAnnotations`
    pub annotations: Option<Arc<[u8]>>,
    /// Raw `RuntimeVisibleParameterAnnotations`
    pub parameter_annotations: Option<Arc<[u8]>>,
}

/// A finished reflection object
#[derive(Debug, Clone)]
pub enum Reflection {
    /// Field view
    Field(FieldReflection),
    /// Method view
    Method(MethodReflection),
    /// Constructor view
    Constructor(ConstructorReflection),
}

impl Reflection {
    /// Declaring class of the reflected member
    pub fn declaring_class(&self) -> &ClassRef {
        match self {
            Reflection::Field(f) => &f.declaring_class,
            Reflection::Method(m) => &m.declaring_class,
            Reflection::Constructor(c) => &c.declaring_class,
        }
    }

    /// Slot of the reflected member
    pub fn slot(&self) -> i32 {
        match self {
            Reflection::Field(f) => f.slot,
            Reflection::Method(m) => m.slot,
            Reflection::Constructor(c) => c.slot,
        }
    }
}

pub(crate) fn reflect_field(
    field: &Field,
    loader: &dyn ClassLoader,
    thread: &mut dyn JvmThread,
    callback: ReflectCallback,
) {
    let descriptor = field.raw_descriptor().to_string();
    trace!(field = %field.full_name(), %descriptor, "reflection requested");

    let declaring_class = Arc::clone(field.owning_class());
    let name = field.name().to_string();
    let modifiers = field.access_flags().modifiers();
    let slot = field.slot();
    let signature = field.generic_signature().map(str::to_string);
    let annotations = field.annotations();

    loader.resolve_class(
        thread,
        &descriptor,
        Box::new(move |resolved: Option<ClassRef>| {
            let reflection = resolved.map(|field_type| {
                Reflection::Field(FieldReflection {
                    declaring_class,
                    name,
                    field_type,
                    modifiers,
                    slot,
                    signature,
                    annotations,
                })
            });
            callback(reflection);
        }),
    );
}

/// Everything a method view needs, captured before the loader is asked
struct MethodPlan {
    declaring_class: ClassRef,
    name: String,
    constructor: bool,
    parameters: Vec<String>,
    return_type: String,
    exceptions: Vec<String>,
    modifiers: u16,
    slot: i32,
    signature: Option<String>,
    annotations: Option<Arc<[u8]>>,
    parameter_annotations: Option<Arc<[u8]>>,
    annotation_default: Option<Arc<[u8]>>,
}

impl MethodPlan {
    fn new(method: &Method) -> Self {
        Self {
            declaring_class: Arc::clone(method.owning_class()),
            name: method.name().to_string(),
            constructor: method.is_constructor(),
            parameters: method.descriptor().parameter_descriptors(),
            return_type: method.return_type().descriptor(),
            exceptions: method
                .exception_types()
                .iter()
                .map(|name| class_name_to_descriptor(name))
                .collect(),
            modifiers: method.access_flags().modifiers(),
            slot: method.slot(),
            signature: method.generic_signature().map(str::to_string),
            annotations: method.annotations(),
            parameter_annotations: method.parameter_annotations(),
            annotation_default: method.annotation_default(),
        }
    }

    fn build(self, classes: &FxHashMap<String, ClassRef>) -> Option<Reflection> {
        let lookup = |descs: &[String]| -> Option<Vec<ClassRef>> {
            descs.iter().map(|d| classes.get(d).cloned()).collect()
        };
        let parameter_types = lookup(&self.parameters)?;
        let exception_types = lookup(&self.exceptions)?;

        if self.constructor {
            return Some(Reflection::Constructor(ConstructorReflection {
                declaring_class: self.declaring_class,
                parameter_types,
                exception_types,
                modifiers: self.modifiers,
                slot: self.slot,
                signature: self.signature,
                annotations: self.annotations,
                parameter_annotations: self.parameter_annotations,
            }));
        }

        let return_type = classes.get(&self.return_type).cloned()?;
        Some(Reflection::Method(MethodReflection {
            declaring_class: self.declaring_class,
            name: self.name,
            parameter_types,
            return_type,
            exception_types,
            modifiers: self.modifiers,
            slot: self.slot,
            signature: self.signature,
            annotations: self.annotations,
            parameter_annotations: self.parameter_annotations,
            annotation_default: self.annotation_default,
        }))
    }
}

pub(crate) fn reflect_method(
    method: &Method,
    loader: &dyn ClassLoader,
    thread: &mut dyn JvmThread,
    callback: ReflectCallback,
) {
    let plan = MethodPlan::new(method);

    // Handler catch types are loaded too, though the view does not list them
    let catch_types: Vec<String> = match method.code_attribute() {
        Ok(code) => code.catch_types().map(class_name_to_descriptor).collect(),
        Err(_) => Vec::new(),
    };

    let mut wanted = plan.parameters.clone();
    if !plan.constructor {
        wanted.push(plan.return_type.clone());
    }
    wanted.extend(plan.exceptions.iter().cloned());
    wanted.extend(catch_types);
    let descriptors = dedup(wanted);

    trace!(
        method = %method.full_signature(),
        types = descriptors.len(),
        "reflection requested"
    );

    loader.resolve_classes(
        thread,
        &descriptors,
        Box::new(move |resolved: Option<FxHashMap<String, ClassRef>>| {
            callback(resolved.and_then(|classes| plan.build(&classes)));
        }),
    );
}

/// Remove duplicates, keeping first occurrences in order
fn dedup(descriptors: Vec<String>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    descriptors
        .into_iter()
        .filter(|d| seen.insert(d.clone()))
        .collect()
}
