//! Fields

use std::fmt;

use javelin_sdk::{JvmThread, Value};

use crate::attributes::{names, Attribute, ConstantValue};
use crate::class::ClassRef;
use crate::classfile::{AttributeParser, ClassReader, ConstantPool, MemberRecord};
use crate::descriptor::{parse_field_descriptor, FieldType};
use crate::member::{Member, MemberInfo};
use crate::reflect::{self, ClassLoader, ReflectCallback};
use crate::LinkResult;

/// A linked field
pub struct Field {
    info: MemberInfo,
    field_type: FieldType,
    full_name: String,
}

impl Field {
    /// Link a field from its header; fails on a malformed descriptor
    pub fn new(info: MemberInfo) -> LinkResult<Self> {
        let field_type = parse_field_descriptor(info.raw_descriptor())?;
        let full_name = format!("{}/{}", info.owning_class().internal_name(), info.name());
        Ok(Self {
            info,
            field_type,
            full_name,
        })
    }

    /// Link a field from a record already read out of a class file
    pub fn from_record(owning_class: ClassRef, record: MemberRecord) -> LinkResult<Self> {
        Self::new(MemberInfo::from_record(owning_class, record))
    }

    /// Read a `field_info` record at the reader's position and link it
    pub fn read(
        owning_class: ClassRef,
        reader: &mut ClassReader<'_>,
        pool: &dyn ConstantPool,
        parser: &dyn AttributeParser,
    ) -> LinkResult<Self> {
        let record = MemberRecord::read(reader, pool, parser)?;
        Self::from_record(owning_class, record)
    }

    /// Declaring class internal name, `/`, then the field name
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Parsed type
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Value the field holds before any initializer runs
    pub fn default_value(&self) -> Value {
        self.field_type.default_value()
    }

    /// Compile-time constant from the `ConstantValue` attribute
    pub fn constant_value(&self) -> Option<&ConstantValue> {
        match self.attribute(names::CONSTANT_VALUE) {
            Some(Attribute::ConstantValue(value)) => Some(value),
            _ => None,
        }
    }

    /// Build a `java.lang.reflect.Field` view once the field's type is
    /// loaded; `callback` receives `None` if it cannot be.
    pub fn reflect(
        &self,
        loader: &dyn ClassLoader,
        thread: &mut dyn JvmThread,
        callback: ReflectCallback,
    ) {
        reflect::reflect_field(self, loader, thread, callback);
    }
}

impl Member for Field {
    fn info(&self) -> &MemberInfo {
        &self.info
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("full_name", &self.full_name)
            .field("type", &self.field_type)
            .field("access_flags", &self.access_flags())
            .field("slot", &self.slot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassHandle;
    use crate::flags::AccessFlags;
    use crate::LinkError;
    use javelin_sdk::ObjectRef;

    fn owner() -> ClassRef {
        ClassHandle::new("pkg/Owner", ObjectRef::from_raw(1))
    }

    #[test]
    fn test_static_int_field() {
        let info = MemberInfo::new(
            owner(),
            AccessFlags::STATIC,
            "counter",
            "I",
            Vec::new(),
        );
        let field = Field::new(info).unwrap();
        assert_eq!(field.full_name(), "pkg/Owner/counter");
        assert_eq!(field.default_value(), Value::int(0));
        assert!(field.is_static());
        assert_eq!(field.slot(), -1);
    }

    #[test]
    fn test_default_values_by_type() {
        let cases = [
            ("J", Value::long(0)),
            ("D", Value::double(0.0)),
            ("F", Value::float(0.0)),
            ("Z", Value::int(0)),
            ("Ljava/lang/String;", Value::null()),
            ("[I", Value::null()),
        ];
        for (desc, expected) in cases {
            let field =
                Field::new(MemberInfo::new(owner(), AccessFlags::empty(), "f", desc, Vec::new()))
                    .unwrap();
            assert_eq!(field.default_value(), expected, "{}", desc);
        }
    }

    #[test]
    fn test_constant_value() {
        let info = MemberInfo::new(
            owner(),
            AccessFlags::STATIC | AccessFlags::FINAL,
            "MAX",
            "J",
            vec![Attribute::ConstantValue(ConstantValue::Long(42))],
        );
        let field = Field::new(info).unwrap();
        assert_eq!(field.constant_value(), Some(&ConstantValue::Long(42)));
    }

    #[test]
    fn test_bad_descriptor() {
        let info = MemberInfo::new(owner(), AccessFlags::empty(), "f", "V", Vec::new());
        assert!(matches!(Field::new(info), Err(LinkError::Descriptor(_))));
    }
}
