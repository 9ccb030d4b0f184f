//! JvmThread trait: the execution context handed to native methods
//!
//! The interpreter owns the real thread object (call stack, pending
//! exception, monitor state). Native and builtin implementations program
//! against this trait only, and always receive it as their first argument.

use crate::error::AbiResult;
use crate::value::Value;

/// Scheduling state of a guest thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadStatus {
    /// Created, not yet started
    New,
    /// Ready to run; the scheduler will drive its top frame
    Runnable,
    /// Waiting to acquire a monitor
    Blocked,
    /// Parked by `LockSupport.park`
    Parked,
    /// Waiting on a monitor
    Waiting,
    /// Waiting on a monitor with a timeout
    TimedWaiting,
    /// Suspended until an asynchronous host operation completes
    AsyncWaiting,
    /// Finished
    Terminated,
}

/// Abstract guest-thread context for native methods.
pub trait JvmThread {
    /// Current scheduling state
    fn status(&self) -> ThreadStatus;

    /// Transition to a new scheduling state
    fn set_status(&mut self, status: ThreadStatus);

    /// Raise a new guest exception of class `class_name` (internal form,
    /// e.g. `java/lang/UnsatisfiedLinkError`) on this thread.
    ///
    /// The exception is delivered through the guest's exception-handling
    /// path; bytecode callers may catch it.
    fn throw_new_exception(&mut self, class_name: &str, message: &str);

    /// Read the contents of a `java.lang.String` reference
    fn read_string(&self, val: Value) -> AbiResult<String>;
}
