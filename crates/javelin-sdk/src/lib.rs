//! Javelin SDK - Lightweight SDK for writing native method libraries
//!
//! This crate provides the minimal types needed to implement native methods
//! for the Javelin VM without depending on the linking core:
//! - [`Value`] / [`ObjectRef`]: word-sized VM values and heap handles
//! - [`JvmThread`]: the execution context every native receives first
//! - [`NativeRegistry`] / [`NativeLibrary`]: registration keyed by class and signature
//!
//! # Example
//!
//! ```ignore
//! use javelin_sdk::{NativeLibrary, NativeCallResult, NativeRegistry};
//!
//! let mut lib = NativeLibrary::new("java/lang/Runtime");
//! lib.register("availableProcessors()I", |_thread, _args| NativeCallResult::int(1));
//! registry.register_library(lib)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod handler;
pub mod thread;
pub mod value;

pub use convert::{FromValue, IntoValue};
pub use error::{AbiResult, NativeError};
pub use handler::{native_fn, NativeCallResult, NativeFn, NativeLibrary, NativeRegistry};
pub use thread::{JvmThread, ThreadStatus};
pub use value::{ObjectRef, Value};
