//! Native resolution, builtin overrides and native calls
//!
//! Covers:
//! - builtin overrides trapping methods at construction
//! - init-hook stubs
//! - lazy binding against the registry, failure then success
//! - racing first resolutions binding a single implementation
//! - argument compaction and signature-polymorphic pass-through
//! - monitor selection for synchronized methods

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use javelin_core::native::UNSATISFIED_LINK_ERROR;
use javelin_core::{
    AccessFlags, BuiltinTable, CodeState, LinkContext, LinkError, LinkOptions, Member, MemberInfo,
    Method,
};
use javelin_sdk::{NativeCallResult, NativeRegistry, ObjectRef, Value};
use parking_lot::Mutex;

// ===== Builtin overrides =====

#[test]
fn test_builtin_override_forces_native() {
    let ctx = LinkContext::default();
    let owner = class("java/util/concurrent/atomic/AtomicLong", 1);
    // Declared native in the class file, but an override wins either way
    let info = MemberInfo::new(
        owner,
        AccessFlags::PRIVATE | AccessFlags::STATIC,
        "VMSupportsCS8",
        "()Z",
        vec![bytecode(0)],
    );
    let method = Method::new(info, &ctx).unwrap();

    assert!(method.is_native());
    assert_eq!(method.code_state(), CodeState::Trapped);

    let mut thread = FakeThread::new();
    let result = method.invoke_native(&mut thread, &[]).unwrap();
    assert_eq!(result, NativeCallResult::bool(true));
}

#[test]
fn test_builtin_lookup_deterministic() {
    let ctx = LinkContext::default();
    let owner = class("java/lang/ref/Reference", 1);
    for _ in 0..3 {
        let info = MemberInfo::new(
            Arc::clone(&owner),
            AccessFlags::STATIC,
            "<clinit>",
            "()V",
            vec![bytecode(0)],
        );
        let method = Method::new(info, &ctx).unwrap();
        assert_eq!(method.code_state(), CodeState::Trapped);
    }

    // Same signature on another class is untouched
    let other = concrete(&class("java/lang/ref/SoftReference", 2), AccessFlags::STATIC, "<clinit>", "()V");
    assert_eq!(other.code_state(), CodeState::Bytecode);
}

#[test]
fn test_custom_builtin_table() {
    let builtins = Arc::new(BuiltinTable::new());
    builtins.register("pkg/Clock", "now()J", |_t, _a| NativeCallResult::long(1234));
    let ctx = LinkContext::with_tables(
        LinkOptions::bare(),
        builtins,
        Arc::new(NativeRegistry::new()),
    );

    let method = native(&ctx, &class("pkg/Clock", 1), AccessFlags::STATIC, "now", "()J");
    let mut thread = FakeThread::new();
    assert_eq!(
        method.invoke_native(&mut thread, &[]).unwrap(),
        NativeCallResult::long(1234)
    );
}

#[test]
fn test_load_library_builtin() {
    let ctx = LinkContext::new(LinkOptions::default().with_builtin_libraries(["zip"]));
    let method = native(
        &ctx,
        &class("java/lang/System", 1),
        AccessFlags::STATIC,
        "loadLibrary",
        "(Ljava/lang/String;)V",
    );
    let mut thread = FakeThread::new();

    let zip = thread.string(10, "zip");
    assert_eq!(
        method.invoke_native(&mut thread, &[zip]).unwrap(),
        NativeCallResult::Void
    );
    assert!(thread.thrown.is_empty());

    let net = thread.string(11, "net");
    assert!(method.invoke_native(&mut thread, &[net]).unwrap().is_thrown());
    assert_eq!(thread.thrown.len(), 1);
    assert_eq!(thread.thrown[0].0, UNSATISFIED_LINK_ERROR);
    assert_eq!(thread.thrown[0].1, "no net in java.library.path");
}

// ===== Init hooks =====

#[test]
fn test_init_hooks_stubbed() {
    let ctx = LinkContext::default();
    let owner = class("java/lang/Object", 1);
    for name in ["registerNatives", "initIDs"] {
        let method = native(&ctx, &owner, AccessFlags::STATIC, name, "()V");
        assert_eq!(method.code_state(), CodeState::Stub);
        let mut thread = FakeThread::new();
        assert_eq!(
            method.invoke_native(&mut thread, &[]).unwrap(),
            NativeCallResult::Void
        );
        assert!(thread.thrown.is_empty());
    }

    // Only the exact no-arg void form is stubbed
    let other = native(&ctx, &owner, AccessFlags::STATIC, "initIDs", "(I)V");
    assert_eq!(other.code_state(), CodeState::UnresolvedNative);
}

#[test]
fn test_init_hook_stubs_can_be_disabled() {
    let ctx = LinkContext::new(LinkOptions::default().with_stub_init_hooks(false));
    let method = native(&ctx, &class("java/io/FileDescriptor", 1), AccessFlags::STATIC, "initIDs", "()V");
    assert_eq!(method.code_state(), CodeState::UnresolvedNative);
}

// ===== Lazy binding =====

#[test]
fn test_missing_native_then_registered() {
    let ctx = LinkContext::default();
    let owner = class("com/example/Native", 1);
    let method = native(&ctx, &owner, AccessFlags::STATIC, "foo", "()V");
    let mut thread = FakeThread::new();

    let result = method.invoke_native(&mut thread, &[]).unwrap();
    assert!(result.is_thrown());
    assert_eq!(thread.thrown.len(), 1);
    assert_eq!(thread.thrown[0].0, UNSATISFIED_LINK_ERROR);
    assert!(thread.thrown[0].1.contains("foo()V"));
    assert_eq!(method.code_state(), CodeState::UnresolvedNative);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    ctx.natives().register("com/example/Native", "foo()V", move |_t, _a| {
        counter.fetch_add(1, Ordering::SeqCst);
        NativeCallResult::Void
    });

    let result = method.invoke_native(&mut thread, &[]).unwrap();
    assert_eq!(result, NativeCallResult::Void);
    assert_eq!(thread.thrown.len(), 1);
    assert_eq!(method.code_state(), CodeState::ResolvedNative);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let registered = ctx.natives().lookup("com/example/Native", "foo()V").unwrap();
    let bound = method.native_function().unwrap().unwrap();
    assert!(Arc::ptr_eq(&registered, &bound));
}

#[test]
fn test_resolution_happens_once() {
    let ctx = LinkContext::default();
    ctx.natives().register("pkg/N", "v()I", |_t, _a| NativeCallResult::int(1));
    let method = native(&ctx, &class("pkg/N", 1), AccessFlags::STATIC, "v", "()I");
    let mut thread = FakeThread::new();
    assert_eq!(
        method.invoke_native(&mut thread, &[]).unwrap(),
        NativeCallResult::int(1)
    );

    ctx.natives().register("pkg/N", "v()I", |_t, _a| NativeCallResult::int(2));
    assert_eq!(
        method.invoke_native(&mut thread, &[]).unwrap(),
        NativeCallResult::int(1)
    );
}

#[test]
fn test_native_function_of_bytecode_method() {
    let method = concrete(&class("pkg/A", 1), AccessFlags::PUBLIC, "run", "()V");
    assert!(matches!(
        method.native_function(),
        Err(LinkError::ContractViolation(_))
    ));
    let mut thread = FakeThread::new();
    assert!(method.invoke_native(&mut thread, &[]).is_err());
}

#[test]
fn test_concurrent_first_resolution_binds_once() {
    const THREADS: usize = 8;

    let ctx = LinkContext::default();
    ctx.natives().register("pkg/Race", "spin()I", |_t, _a| NativeCallResult::int(7));
    let registered = ctx.natives().lookup("pkg/Race", "spin()I").unwrap();
    let method = Arc::new(native(&ctx, &class("pkg/Race", 1), AccessFlags::STATIC, "spin", "()I"));
    assert_eq!(method.code_state(), CodeState::UnresolvedNative);

    let barrier = Barrier::new(THREADS);
    let bound: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let method = Arc::clone(&method);
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    method.native_function().unwrap().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(bound.len(), THREADS);
    assert!(bound.iter().all(|f| Arc::ptr_eq(f, &registered)));
    assert_eq!(method.code_state(), CodeState::ResolvedNative);

    // Nothing registered: every racer misses and nothing is memoized
    let empty = LinkContext::default();
    let method = Arc::new(native(&empty, &class("pkg/Race", 2), AccessFlags::STATIC, "spin", "()I"));
    let barrier = Barrier::new(THREADS);
    thread::scope(|s| {
        for _ in 0..THREADS {
            let method = Arc::clone(&method);
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                assert!(method.native_function().unwrap().is_none());
            });
        }
    });
    assert_eq!(method.code_state(), CodeState::UnresolvedNative);
}

// ===== Argument compaction =====

#[test]
fn test_instance_args_drop_wide_placeholder() {
    let ctx = LinkContext::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ctx.natives().register("pkg/Sink", "put(JI)V", move |_t, args| {
        sink.lock().extend_from_slice(args);
        NativeCallResult::Void
    });
    let method = native(&ctx, &class("pkg/Sink", 1), AccessFlags::PUBLIC, "put", "(JI)V");

    let receiver = Value::object(ObjectRef::from_raw(0x40));
    let locals = [receiver, Value::long(7), Value::null(), Value::int(3)];
    assert_eq!(
        method.convert_args(&locals).unwrap(),
        vec![receiver, Value::long(7), Value::int(3)]
    );

    let mut thread = FakeThread::new();
    method.invoke_native(&mut thread, &locals).unwrap();
    assert_eq!(*seen.lock(), vec![receiver, Value::long(7), Value::int(3)]);
}

#[test]
fn test_static_args_with_doubles() {
    let ctx = LinkContext::default();
    let method = native(&ctx, &class("pkg/M", 1), AccessFlags::STATIC, "f", "(DID)V");
    let locals = [
        Value::double(1.5),
        Value::null(),
        Value::int(2),
        Value::double(2.5),
        Value::null(),
    ];
    assert_eq!(
        method.convert_args(&locals).unwrap(),
        vec![Value::double(1.5), Value::int(2), Value::double(2.5)]
    );
}

#[test]
fn test_short_locals_rejected() {
    let ctx = LinkContext::default();
    let method = native(&ctx, &class("pkg/M", 1), AccessFlags::STATIC, "f", "(JI)V");
    assert!(matches!(
        method.convert_args(&[Value::long(1), Value::null()]),
        Err(LinkError::ContractViolation(_))
    ));
}

#[test]
fn test_signature_polymorphic_predicate() {
    let ctx = LinkContext::default();
    let handle = class("java/lang/invoke/MethodHandle", 1);
    let poly_flags = AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::VARARGS;
    let poly_desc = "([Ljava/lang/Object;)Ljava/lang/Object;";

    let invoke = native(&ctx, &handle, poly_flags, "invokeExact", poly_desc);
    assert!(invoke.is_signature_polymorphic());

    let raw = [
        Value::object(ObjectRef::from_raw(1)),
        Value::long(5),
        Value::null(),
    ];
    assert_eq!(invoke.convert_args(&raw).unwrap(), raw.to_vec());

    // Any one ingredient missing disqualifies it
    let not_varargs = native(&ctx, &handle, AccessFlags::PUBLIC, "invoke", poly_desc);
    assert!(!not_varargs.is_signature_polymorphic());

    let other_desc = native(&ctx, &handle, poly_flags, "invoke", "([Ljava/lang/Object;)V");
    assert!(!other_desc.is_signature_polymorphic());

    let other_class = native(&ctx, &class("java/lang/invoke/VarHandle", 2), poly_flags, "get", poly_desc);
    assert!(!other_class.is_signature_polymorphic());

    let info = MemberInfo::new(Arc::clone(&handle), poly_flags, "invoke", poly_desc, vec![bytecode(2)]);
    let not_native = Method::new(info, &ctx).unwrap();
    assert!(!not_native.is_signature_polymorphic());
}

// ===== Lock selection =====

#[test]
fn test_lock_target() {
    let owner = class("pkg/Account", 0x99);
    let static_sync = concrete(
        &owner,
        AccessFlags::STATIC | AccessFlags::SYNCHRONIZED,
        "audit",
        "()V",
    );
    assert_eq!(static_sync.lock_target(&[]).unwrap(), ObjectRef::from_raw(0x99));

    let instance_sync = concrete(&owner, AccessFlags::SYNCHRONIZED, "deposit", "(J)V");
    let receiver = ObjectRef::from_raw(0x500);
    let locals = [Value::object(receiver), Value::long(10), Value::null()];
    assert_eq!(instance_sync.lock_target(&locals).unwrap(), receiver);

    assert!(matches!(
        instance_sync.lock_target(&[Value::null()]),
        Err(LinkError::ContractViolation(_))
    ));
    assert!(matches!(
        instance_sync.lock_target(&[Value::int(1)]),
        Err(LinkError::ContractViolation(_))
    ));
    assert!(instance_sync.lock_target(&[]).is_err());
}
