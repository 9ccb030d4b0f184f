//! Attribute records attached to fields and methods
//!
//! These are the already-parsed forms handed over by the attribute parser.
//! Annotation payloads stay as raw bytes; reflection surfaces them unchanged.

use std::sync::Arc;

/// Well-known attribute names
pub mod names {
    /// Bytecode body of a method
    pub const CODE: &str = "Code";
    /// Generic signature
    pub const SIGNATURE: &str = "Signature";
    /// Declared checked exceptions
    pub const EXCEPTIONS: &str = "Exceptions";
    /// Compile-time constant of a static field
    pub const CONSTANT_VALUE: &str = "ConstantValue";
    /// Runtime-visible annotations
    pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
    /// Runtime-visible parameter annotations
    pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
    /// Default value of an annotation interface element
    pub const ANNOTATION_DEFAULT: &str = "AnnotationDefault";
    /// Bytecode offset to source line mapping (nested in Code)
    pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
}

/// A parsed member attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `Code`
    Code(Arc<CodeAttribute>),
    /// `Signature`: generic signature string
    Signature(String),
    /// `Exceptions`: internal names of declared exception classes
    Exceptions(Vec<String>),
    /// `ConstantValue`
    ConstantValue(ConstantValue),
    /// `RuntimeVisibleAnnotations`: raw payload
    RuntimeVisibleAnnotations(Arc<[u8]>),
    /// `RuntimeVisibleParameterAnnotations`: raw payload
    RuntimeVisibleParameterAnnotations(Arc<[u8]>),
    /// `AnnotationDefault`: raw payload
    AnnotationDefault(Arc<[u8]>),
    /// `LineNumberTable`
    LineNumberTable(Vec<LineNumberEntry>),
    /// Any attribute this crate does not interpret
    Unknown {
        /// Attribute name
        name: String,
        /// Raw payload
        data: Arc<[u8]>,
    },
}

impl Attribute {
    /// The attribute's name as it appears in the class file
    pub fn name(&self) -> &str {
        match self {
            Attribute::Code(_) => names::CODE,
            Attribute::Signature(_) => names::SIGNATURE,
            Attribute::Exceptions(_) => names::EXCEPTIONS,
            Attribute::ConstantValue(_) => names::CONSTANT_VALUE,
            Attribute::RuntimeVisibleAnnotations(_) => names::RUNTIME_VISIBLE_ANNOTATIONS,
            Attribute::RuntimeVisibleParameterAnnotations(_) => {
                names::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS
            }
            Attribute::AnnotationDefault(_) => names::ANNOTATION_DEFAULT,
            Attribute::LineNumberTable(_) => names::LINE_NUMBER_TABLE,
            Attribute::Unknown { name, .. } => name,
        }
    }

    /// Raw bytes of an annotation-carrying attribute
    pub fn annotation_bytes(&self) -> Option<Arc<[u8]>> {
        match self {
            Attribute::RuntimeVisibleAnnotations(data)
            | Attribute::RuntimeVisibleParameterAnnotations(data)
            | Attribute::AnnotationDefault(data) => Some(Arc::clone(data)),
            _ => None,
        }
    }
}

/// First attribute named `name`
pub fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|attr| attr.name() == name)
}

/// Every attribute named `name`, in order
pub fn find_attributes<'a>(attributes: &'a [Attribute], name: &str) -> Vec<&'a Attribute> {
    attributes.iter().filter(|attr| attr.name() == name).collect()
}

/// Value of a `ConstantValue` attribute
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `int`, `short`, `char`, `byte`, `boolean`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// `String`
    String(String),
}

/// One entry of a Code attribute's exception table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First covered bytecode offset (inclusive)
    pub start_pc: u16,
    /// Last covered bytecode offset (exclusive)
    pub end_pc: u16,
    /// Handler entry offset
    pub handler_pc: u16,
    /// Internal name of the caught class; `None` catches everything
    pub catch_type: Option<String>,
}

/// One `LineNumberTable` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    /// First bytecode offset of the line
    pub start_pc: u16,
    /// Source line number
    pub line_number: u16,
}

/// The `Code` attribute of a bytecode method
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeAttribute {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Size of the local-variable array, in words
    pub max_locals: u16,
    /// Bytecode
    pub code: Vec<u8>,
    /// Exception table
    pub exception_handlers: Vec<ExceptionHandler>,
    /// Nested attributes (line numbers, local variables, stack maps)
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    /// Internal names of the classes caught by this method's handlers,
    /// in table order, without catch-all entries
    pub fn catch_types(&self) -> impl Iterator<Item = &str> {
        self.exception_handlers
            .iter()
            .filter_map(|h| h.catch_type.as_deref())
    }

    /// Source line of the instruction at `pc`, if a line table is present
    pub fn line_number(&self, pc: u16) -> Option<u16> {
        let mut best: Option<LineNumberEntry> = None;
        for attr in &self.attributes {
            if let Attribute::LineNumberTable(entries) = attr {
                for entry in entries.iter().filter(|e| e.start_pc <= pc) {
                    if best.map_or(true, |b| entry.start_pc >= b.start_pc) {
                        best = Some(*entry);
                    }
                }
            }
        }
        best.map(|entry| entry.line_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let attrs = vec![
            Attribute::Signature("TT;".into()),
            Attribute::Unknown {
                name: "Deprecated".into(),
                data: Arc::from(Vec::new()),
            },
            Attribute::Unknown {
                name: "Deprecated".into(),
                data: Arc::from(vec![1u8]),
            },
        ];

        assert_eq!(find_attribute(&attrs, "Signature"), Some(&attrs[0]));
        assert_eq!(find_attribute(&attrs, "Deprecated"), Some(&attrs[1]));
        assert_eq!(find_attributes(&attrs, "Deprecated").len(), 2);
        assert!(find_attribute(&attrs, "Code").is_none());
    }

    #[test]
    fn test_catch_types_skip_catch_all() {
        let code = CodeAttribute {
            exception_handlers: vec![
                ExceptionHandler {
                    start_pc: 0,
                    end_pc: 4,
                    handler_pc: 8,
                    catch_type: Some("java/io/IOException".into()),
                },
                ExceptionHandler {
                    start_pc: 0,
                    end_pc: 4,
                    handler_pc: 12,
                    catch_type: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(code.catch_types().collect::<Vec<_>>(), vec!["java/io/IOException"]);
    }

    #[test]
    fn test_line_numbers() {
        let code = CodeAttribute {
            attributes: vec![Attribute::LineNumberTable(vec![
                LineNumberEntry {
                    start_pc: 0,
                    line_number: 10,
                },
                LineNumberEntry {
                    start_pc: 5,
                    line_number: 11,
                },
            ])],
            ..Default::default()
        };
        assert_eq!(code.line_number(0), Some(10));
        assert_eq!(code.line_number(4), Some(10));
        assert_eq!(code.line_number(9), Some(11));
        assert_eq!(CodeAttribute::default().line_number(0), None);
    }
}
