//! Javelin Core - member linking and invocation dispatch
//!
//! This crate turns parsed class-member records into live members:
//! - [`Field`] and [`Method`], sharing the [`Member`] model
//! - native resolution: builtin overrides, init-hook stubs and lazy binding
//!   against the VM's [`NativeRegistry`](javelin_sdk::NativeRegistry)
//! - argument compaction for native calls and monitor selection for
//!   synchronized methods
//! - asynchronous construction of reflection objects
//! - invocation thunks that push frames onto an interpreter thread
//!
//! Constant-pool parsing, class loading, the interpreter loop and the heap
//! are external; they plug in through [`ConstantPool`], [`AttributeParser`],
//! [`ClassLoader`], [`InterpreterThread`] and
//! [`JvmThread`](javelin_sdk::JvmThread).

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod attributes;
pub mod builtins;
pub mod class;
pub mod classfile;
pub mod descriptor;
pub mod field;
pub mod flags;
pub mod invoke;
pub mod member;
pub mod method;
pub mod native;
pub mod options;
pub mod reflect;

pub use attributes::{Attribute, CodeAttribute, ConstantValue, ExceptionHandler, LineNumberEntry};
pub use builtins::BuiltinTable;
pub use class::{ClassHandle, ClassRef};
pub use classfile::{AttributeParser, ClassReadError, ClassReader, ConstantPool, MemberRecord};
pub use descriptor::{DescriptorError, FieldType, MethodDescriptor, ReturnType};
pub use field::Field;
pub use flags::AccessFlags;
pub use invoke::{CallTable, Completion, CompletionCallback, InterpreterThread, Invoker, StackFrame};
pub use member::{Member, MemberInfo};
pub use method::Method;
pub use native::{CodeState, MethodCode};
pub use options::{LinkContext, LinkOptions};
pub use reflect::{
    ClassLoader, ConstructorReflection, FieldReflection, MethodReflection, ReflectCallback,
    Reflection,
};

use thiserror::Error;

/// Errors raised while linking or dispatching a member.
///
/// Guest-visible failures (a native method with no implementation) are not
/// errors here; they are raised on the guest thread instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Malformed descriptor
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Malformed member record
    #[error(transparent)]
    ClassRead(#[from] ClassReadError),

    /// Non-native, non-abstract method without a `Code` attribute
    #[error("Method {0} has no Code attribute")]
    MissingCode(String),

    /// Caller broke an invariant the linker relies on
    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

/// Result type for linking operations
pub type LinkResult<T> = Result<T, LinkError>;
