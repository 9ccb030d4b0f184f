//! Fakes of the collaborators the linker talks to: a guest thread, a
//! constant pool, an attribute parser and a class loader.

#![allow(dead_code)]

use std::sync::Arc;

use javelin_core::attributes::names;
use javelin_core::reflect::{BatchResolveCallback, ResolveCallback};
use javelin_core::{
    AccessFlags, Attribute, AttributeParser, ClassHandle, ClassLoader, ClassReadError,
    ClassReader, ClassRef, CodeAttribute, ConstantPool, InterpreterThread, LinkContext, Member,
    MemberInfo, Method, StackFrame,
};
use javelin_sdk::{AbiResult, JvmThread, NativeError, ObjectRef, ThreadStatus, Value};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

// ===== Thread =====

#[derive(Debug)]
pub struct FakeThread {
    pub status: ThreadStatus,
    pub thrown: Vec<(String, String)>,
    pub frames: Vec<StackFrame>,
    pub strings: FxHashMap<u64, String>,
}

impl FakeThread {
    pub fn new() -> Self {
        Self {
            status: ThreadStatus::New,
            thrown: Vec::new(),
            frames: Vec::new(),
            strings: FxHashMap::default(),
        }
    }

    /// Intern a guest string and return its reference value
    pub fn string(&mut self, raw: u64, contents: &str) -> Value {
        self.strings.insert(raw, contents.to_string());
        Value::object(ObjectRef::from_raw(raw))
    }
}

impl JvmThread for FakeThread {
    fn status(&self) -> ThreadStatus {
        self.status
    }

    fn set_status(&mut self, status: ThreadStatus) {
        self.status = status;
    }

    fn throw_new_exception(&mut self, class_name: &str, message: &str) {
        self.thrown.push((class_name.to_string(), message.to_string()));
    }

    fn read_string(&self, val: Value) -> AbiResult<String> {
        val.as_object()
            .and_then(|obj| self.strings.get(&obj.raw()).cloned())
            .ok_or_else(|| NativeError::ArgumentError(format!("not a string: {:?}", val)))
    }
}

impl InterpreterThread for FakeThread {
    fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }
}

// ===== Class-file input =====

/// Constant pool holding only UTF-8 entries; index 0 is unusable
pub struct FakePool {
    entries: Vec<String>,
}

impl FakePool {
    pub fn new() -> Self {
        Self {
            entries: vec![String::new()],
        }
    }

    pub fn add(&mut self, s: &str) -> u16 {
        self.entries.push(s.to_string());
        (self.entries.len() - 1) as u16
    }
}

impl ConstantPool for FakePool {
    fn utf8(&self, index: u16) -> Option<&str> {
        match index {
            0 => None,
            i => self.entries.get(i as usize).map(String::as_str),
        }
    }
}

/// Understands `Code` (without nested attributes), `Exceptions` and
/// `Signature`; anything else is kept raw
pub struct FakeAttributeParser;

impl AttributeParser for FakeAttributeParser {
    fn parse_attributes(
        &self,
        reader: &mut ClassReader<'_>,
        pool: &dyn ConstantPool,
    ) -> Result<Vec<Attribute>, ClassReadError> {
        let count = reader.read_u16()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.expect_utf8(reader.read_u16()?)?.to_string();
            let length = reader.read_u32()? as usize;
            let end = reader.position() + length;
            let attribute = match name.as_str() {
                names::CODE => {
                    let max_stack = reader.read_u16()?;
                    let max_locals = reader.read_u16()?;
                    let code_length = reader.read_u32()? as usize;
                    let code = reader.read_bytes(code_length)?.to_vec();
                    Attribute::Code(Arc::new(CodeAttribute {
                        max_stack,
                        max_locals,
                        code,
                        ..Default::default()
                    }))
                }
                names::EXCEPTIONS => {
                    let n = reader.read_u16()?;
                    let mut classes = Vec::with_capacity(n as usize);
                    for _ in 0..n {
                        classes.push(pool.expect_utf8(reader.read_u16()?)?.to_string());
                    }
                    Attribute::Exceptions(classes)
                }
                names::SIGNATURE => {
                    Attribute::Signature(pool.expect_utf8(reader.read_u16()?)?.to_string())
                }
                _ => Attribute::Unknown {
                    name: name.clone(),
                    data: Arc::from(reader.read_bytes(length)?),
                },
            };
            if reader.position() != end {
                return Err(ClassReadError::MalformedAttribute {
                    name,
                    reason: format!("length {} does not match contents", length),
                });
            }
            attributes.push(attribute);
        }
        Ok(attributes)
    }
}

/// Big-endian byte builder for member records
#[derive(Default)]
pub struct RecordBytes(pub Vec<u8>);

impl RecordBytes {
    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }
}

// ===== Class loader =====

/// Loader that knows a fixed set of classes and answers synchronously
pub struct FakeLoader {
    classes: FxHashMap<String, ClassRef>,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        let mut loader = Self {
            classes: FxHashMap::default(),
            requests: Mutex::new(Vec::new()),
        };
        for (i, prim) in ["V", "Z", "B", "C", "S", "I", "J", "F", "D"].iter().enumerate() {
            loader.define(prim, 0x100 + i as u64);
        }
        loader
    }

    /// Make the class with descriptor `descriptor` loadable
    pub fn define(&mut self, descriptor: &str, mirror: u64) -> ClassRef {
        let name = descriptor
            .strip_prefix('L')
            .and_then(|d| d.strip_suffix(';'))
            .unwrap_or(descriptor);
        let class = ClassHandle::new(name, ObjectRef::from_raw(mirror));
        self.classes.insert(descriptor.to_string(), Arc::clone(&class));
        class
    }
}

impl ClassLoader for FakeLoader {
    fn resolve_class(&self, _thread: &mut dyn JvmThread, descriptor: &str, callback: ResolveCallback) {
        self.requests.lock().push(vec![descriptor.to_string()]);
        callback(self.classes.get(descriptor).cloned());
    }

    fn resolve_classes(
        &self,
        _thread: &mut dyn JvmThread,
        descriptors: &[String],
        callback: BatchResolveCallback,
    ) {
        self.requests.lock().push(descriptors.to_vec());
        let resolved: Option<FxHashMap<String, ClassRef>> = descriptors
            .iter()
            .map(|d| self.classes.get(d).map(|c| (d.clone(), Arc::clone(c))))
            .collect();
        callback(resolved);
    }
}

// ===== Builders =====

pub fn class(name: &str, mirror: u64) -> ClassRef {
    ClassHandle::new(name, ObjectRef::from_raw(mirror))
}

pub fn bytecode(max_locals: u16) -> Attribute {
    Attribute::Code(Arc::new(CodeAttribute {
        max_stack: 2,
        max_locals,
        code: vec![0xB1], // return
        ..Default::default()
    }))
}

/// A concrete method with a trivial body
pub fn concrete(owner: &ClassRef, flags: AccessFlags, name: &str, desc: &str) -> Method {
    let info = MemberInfo::new(Arc::clone(owner), flags, name, desc, vec![bytecode(4)]);
    Method::new(info, &LinkContext::default()).unwrap()
}

/// A native method linked against `ctx`
pub fn native(
    ctx: &LinkContext,
    owner: &ClassRef,
    flags: AccessFlags,
    name: &str,
    desc: &str,
) -> Method {
    let info = MemberInfo::new(
        Arc::clone(owner),
        flags | AccessFlags::NATIVE,
        name,
        desc,
        Vec::new(),
    );
    Method::new(info, ctx).unwrap()
}

/// Collects the value handed to a continuation
pub fn capture<T: Send + 'static>() -> (Arc<Mutex<Option<T>>>, Box<dyn FnOnce(T) + Send>) {
    let slot = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    (slot, Box::new(move |value: T| *sink.lock() = Some(value)))
}

pub fn assert_slot_unassigned(member: &dyn Member) {
    assert_eq!(member.slot(), -1);
}
