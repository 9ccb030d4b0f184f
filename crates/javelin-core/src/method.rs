//! Methods
//!
//! A [`Method`] owns its parsed descriptor and the code selected by the
//! native resolution engine. The interpreter reaches everything it needs
//! to dispatch a call through here: parameter word counts, monitor
//! selection for synchronized methods, argument compaction for native
//! calls, and the native call itself.

use std::fmt;
use std::sync::Arc;

use javelin_sdk::{JvmThread, NativeCallResult, NativeFn, ObjectRef, Value};
use tracing::{debug, warn};

use crate::attributes::{find_attribute, names, Attribute, CodeAttribute};
use crate::class::ClassRef;
use crate::classfile::{AttributeParser, ClassReader, ConstantPool, MemberRecord};
use crate::descriptor::{FieldType, MethodDescriptor, ReturnType};
use crate::member::{Member, MemberInfo};
use crate::native::{CodeState, MethodCode, INIT_HOOK_SIGNATURES, UNSATISFIED_LINK_ERROR};
use crate::options::LinkContext;
use crate::reflect::{self, ClassLoader, ReflectCallback};
use crate::{LinkError, LinkResult};

/// Name of instance initializers
pub const CONSTRUCTOR_NAME: &str = "<init>";
/// Name of class initializers
pub const CLASS_INITIALIZER_NAME: &str = "<clinit>";

const METHOD_HANDLE_CLASS: &str = "java/lang/invoke/MethodHandle";
const POLYMORPHIC_DESCRIPTOR: &str = "([Ljava/lang/Object;)Ljava/lang/Object;";

/// A linked method
pub struct Method {
    info: MemberInfo,
    descriptor: MethodDescriptor,
    signature: String,
    full_signature: String,
    parameter_words: usize,
    code: MethodCode,
}

impl Method {
    /// Link a method from its header.
    ///
    /// A builtin override registered for the method replaces its code and
    /// marks it native. Fails if the descriptor is malformed or a concrete,
    /// non-native method has no `Code` attribute.
    pub fn new(mut info: MemberInfo, ctx: &LinkContext) -> LinkResult<Self> {
        let descriptor = MethodDescriptor::parse(info.raw_descriptor())?;
        let parameter_words = descriptor.parameter_words();

        let class_name = info.owning_class().internal_name().to_string();
        let signature = format!("{}{}", info.name(), info.raw_descriptor());
        let full_signature = format!("{}/{}", class_name, signature);

        let code = if let Some(f) = ctx.builtins().lookup(&class_name, &signature) {
            debug!(method = %full_signature, "native method trapped by builtin");
            info.force_native();
            MethodCode::Trapped(f)
        } else if info.access_flags().is_native() {
            if ctx.options().stub_init_hooks && INIT_HOOK_SIGNATURES.contains(&signature.as_str()) {
                debug!(method = %full_signature, "init hook stubbed");
                MethodCode::Stub
            } else {
                MethodCode::unresolved(Arc::clone(ctx.natives()))
            }
        } else if info.access_flags().is_abstract() {
            MethodCode::Abstract
        } else {
            match find_attribute(info.attributes(), names::CODE) {
                Some(Attribute::Code(code)) => MethodCode::Bytecode(Arc::clone(code)),
                _ => return Err(LinkError::MissingCode(full_signature)),
            }
        };

        Ok(Self {
            info,
            descriptor,
            signature,
            full_signature,
            parameter_words,
            code,
        })
    }

    /// Link a method from a record already read out of a class file
    pub fn from_record(
        owning_class: ClassRef,
        record: MemberRecord,
        ctx: &LinkContext,
    ) -> LinkResult<Self> {
        Self::new(MemberInfo::from_record(owning_class, record), ctx)
    }

    /// Read a `method_info` record at the reader's position and link it
    pub fn read(
        owning_class: ClassRef,
        reader: &mut ClassReader<'_>,
        pool: &dyn ConstantPool,
        parser: &dyn AttributeParser,
        ctx: &LinkContext,
    ) -> LinkResult<Self> {
        let record = MemberRecord::read(reader, pool, parser)?;
        Self::from_record(owning_class, record, ctx)
    }

    /// Name followed by descriptor, e.g. `hashCode()I`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Declaring class internal name, `/`, then the signature
    pub fn full_signature(&self) -> &str {
        &self.full_signature
    }

    /// Parsed descriptor
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Declared parameter types, in order
    pub fn parameter_types(&self) -> &[FieldType] {
        &self.descriptor.parameters
    }

    /// Return type
    pub fn return_type(&self) -> &ReturnType {
        &self.descriptor.return_type
    }

    /// Frame words taken by the declared parameters, receiver excluded
    pub fn parameter_words(&self) -> usize {
        self.parameter_words
    }

    /// Whether this is an instance initializer
    pub fn is_constructor(&self) -> bool {
        self.name() == CONSTRUCTOR_NAME
    }

    /// Whether this is a class initializer
    pub fn is_class_initializer(&self) -> bool {
        self.name() == CLASS_INITIALIZER_NAME
    }

    /// Whether the effective parameter types are fixed per call site
    /// (`MethodHandle.invoke` and friends)
    pub fn is_signature_polymorphic(&self) -> bool {
        let flags = self.access_flags();
        self.owning_class().internal_name() == METHOD_HANDLE_CLASS
            && flags.is_native()
            && flags.is_varargs()
            && self.raw_descriptor() == POLYMORPHIC_DESCRIPTOR
    }

    /// The code that governs execution
    pub fn code(&self) -> &MethodCode {
        &self.code
    }

    /// Resolution state of the code
    pub fn code_state(&self) -> CodeState {
        self.code.state()
    }

    /// Bytecode body; fails for native and abstract methods
    pub fn code_attribute(&self) -> LinkResult<&Arc<CodeAttribute>> {
        match &self.code {
            MethodCode::Bytecode(code) => Ok(code),
            MethodCode::Abstract => Err(LinkError::ContractViolation(format!(
                "abstract method {} has no code",
                self.full_signature
            ))),
            _ => Err(LinkError::ContractViolation(format!(
                "native method {} has no bytecode",
                self.full_signature
            ))),
        }
    }

    /// Native implementation, binding it against the registry on first use.
    ///
    /// `Ok(None)` means the method is native but nothing is registered for
    /// it yet. Fails for methods that are not native.
    pub fn native_function(&self) -> LinkResult<Option<NativeFn>> {
        if !self.code.is_native() {
            return Err(LinkError::ContractViolation(format!(
                "method {} is not native",
                self.full_signature
            )));
        }
        Ok(self
            .code
            .native_function(self.owning_class().internal_name(), &self.signature))
    }

    /// Call the native implementation with the frame's raw locals.
    ///
    /// A missing implementation raises `UnsatisfiedLinkError` on `thread`
    /// and returns [`NativeCallResult::Thrown`]; the method stays unresolved
    /// so a later call can still bind.
    pub fn invoke_native(
        &self,
        thread: &mut dyn JvmThread,
        locals: &[Value],
    ) -> LinkResult<NativeCallResult> {
        let f = match self.native_function()? {
            Some(f) => f,
            None => {
                warn!(method = %self.full_signature, "native method not implemented");
                thread.throw_new_exception(
                    UNSATISFIED_LINK_ERROR,
                    &format!("Native method '{}' not implemented", self.full_signature),
                );
                return Ok(NativeCallResult::Thrown);
            }
        };
        let args = self.convert_args(locals)?;
        Ok(f(thread, &args))
    }

    /// Compact word-indexed locals into the native argument list: the
    /// receiver for instance methods, then one value per declared parameter.
    /// The placeholder word after each `long`/`double` is dropped.
    ///
    /// Signature-polymorphic methods get their locals unchanged.
    pub fn convert_args(&self, locals: &[Value]) -> LinkResult<Vec<Value>> {
        if self.is_signature_polymorphic() {
            return Ok(locals.to_vec());
        }

        let mut args = Vec::with_capacity(self.descriptor.parameters.len() + 1);
        let mut index = 0;
        if !self.is_static() {
            args.push(self.local(locals, 0)?);
            index = 1;
        }
        for param in &self.descriptor.parameters {
            args.push(self.local(locals, index)?);
            index += param.word_size();
        }
        Ok(args)
    }

    /// The object whose monitor a synchronized invocation holds: the class
    /// mirror for static methods, the receiver otherwise
    pub fn lock_target(&self, locals: &[Value]) -> LinkResult<ObjectRef> {
        if self.is_static() {
            return Ok(self.owning_class().class_object());
        }
        locals.first().and_then(Value::as_object).ok_or_else(|| {
            LinkError::ContractViolation(format!(
                "{} needs a non-null receiver in local 0",
                self.full_signature
            ))
        })
    }

    /// Declared checked exceptions, as internal class names
    pub fn exception_types(&self) -> &[String] {
        match self.attribute(names::EXCEPTIONS) {
            Some(Attribute::Exceptions(list)) => list,
            _ => &[],
        }
    }

    /// Raw `RuntimeVisibleParameterAnnotations` payload
    pub fn parameter_annotations(&self) -> Option<Arc<[u8]>> {
        self.attribute(names::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS)
            .and_then(Attribute::annotation_bytes)
    }

    /// Raw `AnnotationDefault` payload
    pub fn annotation_default(&self) -> Option<Arc<[u8]>> {
        self.attribute(names::ANNOTATION_DEFAULT)
            .and_then(Attribute::annotation_bytes)
    }

    /// Source line of the instruction at `pc`
    pub fn line_number(&self, pc: u16) -> Option<u16> {
        match &self.code {
            MethodCode::Bytecode(code) => code.line_number(pc),
            _ => None,
        }
    }

    /// Build a `java.lang.reflect.Method` (or `Constructor`, for `<init>`)
    /// view once every type it mentions is loaded; `callback` receives
    /// `None` if any of them cannot be.
    pub fn reflect(
        &self,
        loader: &dyn ClassLoader,
        thread: &mut dyn JvmThread,
        callback: ReflectCallback,
    ) {
        reflect::reflect_method(self, loader, thread, callback);
    }

    fn local(&self, locals: &[Value], index: usize) -> LinkResult<Value> {
        locals.get(index).copied().ok_or_else(|| {
            LinkError::ContractViolation(format!(
                "{} expects local {} but only {} were passed",
                self.full_signature,
                index,
                locals.len()
            ))
        })
    }
}

impl Member for Method {
    fn info(&self) -> &MemberInfo {
        &self.info
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("full_signature", &self.full_signature)
            .field("access_flags", &self.access_flags())
            .field("slot", &self.slot())
            .field("code", &self.code)
            .finish()
    }
}
