//! Type and method descriptor parsing
//!
//! Descriptors follow the class-file grammar:
//!
//! ```text
//! FieldType  := B | C | D | F | I | J | S | Z | L<internal name>; | [FieldType
//! Method     := ( FieldType* ) ReturnType
//! ReturnType := FieldType | V
//! ```
//!
//! Every parameter occupies one word in a frame except `long` (`J`) and
//! `double` (`D`), which occupy two. The implicit receiver of instance
//! methods is never counted here.

use std::fmt;

use javelin_sdk::Value;
use thiserror::Error;

/// Maximum number of array dimensions a descriptor may carry
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Errors produced while parsing a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Descriptor ended in the middle of a type
    #[error("Unexpected end of descriptor '{descriptor}' at offset {offset}")]
    UnexpectedEnd {
        /// Full descriptor text
        descriptor: String,
        /// Offset where more input was expected
        offset: usize,
    },

    /// Character that cannot start a type
    #[error("Invalid character '{found}' in descriptor '{descriptor}' at offset {offset}")]
    InvalidChar {
        /// Full descriptor text
        descriptor: String,
        /// Offset of the offending character
        offset: usize,
        /// The offending character
        found: char,
    },

    /// `V` used somewhere other than a method return type
    #[error("'V' is only valid as a return type in descriptor '{descriptor}' (offset {offset})")]
    VoidNotAllowed {
        /// Full descriptor text
        descriptor: String,
        /// Offset of the `V`
        offset: usize,
    },

    /// Method descriptor that does not start with `(`
    #[error("Method descriptor '{0}' must start with '('")]
    MissingParameters(String),

    /// Input left over after a complete descriptor
    #[error("Trailing characters in descriptor '{descriptor}' at offset {offset}")]
    TrailingCharacters {
        /// Full descriptor text
        descriptor: String,
        /// Offset of the first unconsumed character
        offset: usize,
    },

    /// More than 255 array dimensions
    #[error("Descriptor '{0}' exceeds {MAX_ARRAY_DIMENSIONS} array dimensions")]
    TooManyDimensions(String),
}

/// A field (non-void) type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `D`
    Double,
    /// `F`
    Float,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `S`
    Short,
    /// `Z`
    Boolean,
    /// `L<internal name>;`
    Reference(String),
    /// `[<element>`
    Array(Box<FieldType>),
}

impl FieldType {
    /// Returns true if this type occupies two words on the stack
    pub fn is_wide(&self) -> bool {
        matches!(self, FieldType::Long | FieldType::Double)
    }

    /// Number of frame words this type occupies
    pub fn word_size(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// Returns true for class and array types
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Reference(_) | FieldType::Array(_))
    }

    /// The descriptor token for this type (e.g. `Ljava/lang/String;`)
    pub fn descriptor(&self) -> String {
        match self {
            FieldType::Byte => "B".into(),
            FieldType::Char => "C".into(),
            FieldType::Double => "D".into(),
            FieldType::Float => "F".into(),
            FieldType::Int => "I".into(),
            FieldType::Long => "J".into(),
            FieldType::Short => "S".into(),
            FieldType::Boolean => "Z".into(),
            FieldType::Reference(name) => format!("L{};", name),
            FieldType::Array(inner) => format!("[{}", inner.descriptor()),
        }
    }

    /// Source-style name (e.g. `java.lang.String`, `int[]`)
    pub fn source_name(&self) -> String {
        match self {
            FieldType::Byte => "byte".into(),
            FieldType::Char => "char".into(),
            FieldType::Double => "double".into(),
            FieldType::Float => "float".into(),
            FieldType::Int => "int".into(),
            FieldType::Long => "long".into(),
            FieldType::Short => "short".into(),
            FieldType::Boolean => "boolean".into(),
            FieldType::Reference(name) => name.replace('/', "."),
            FieldType::Array(inner) => format!("{}[]", inner.source_name()),
        }
    }

    /// Zero value a field of this type holds before any initializer runs
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Byte
            | FieldType::Char
            | FieldType::Short
            | FieldType::Int
            | FieldType::Boolean => Value::int(0),
            FieldType::Long => Value::long(0),
            FieldType::Float => Value::float(0.0),
            FieldType::Double => Value::double(0.0),
            FieldType::Reference(_) | FieldType::Array(_) => Value::null(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// A method return type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// `V`
    Void,
    /// Any field type
    Type(FieldType),
}

impl ReturnType {
    /// The descriptor token for this return type
    pub fn descriptor(&self) -> String {
        match self {
            ReturnType::Void => "V".into(),
            ReturnType::Type(ty) => ty.descriptor(),
        }
    }

    /// Returns true for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnType::Void)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// A parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Declared parameters, in order
    pub parameters: Vec<FieldType>,
    /// Return type
    pub return_type: ReturnType,
}

impl MethodDescriptor {
    /// Parse a method descriptor such as `(Ljava/lang/String;IJ)V`
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let bytes = descriptor.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(DescriptorError::MissingParameters(descriptor.to_string()));
        }

        let mut parameters = Vec::new();
        let mut pos = 1;
        loop {
            match bytes.get(pos) {
                None => {
                    return Err(DescriptorError::UnexpectedEnd {
                        descriptor: descriptor.to_string(),
                        offset: pos,
                    })
                }
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) => {
                    let (ty, next) = parse_type_at(descriptor, pos)?;
                    parameters.push(ty);
                    pos = next;
                }
            }
        }

        let return_type = if bytes.get(pos) == Some(&b'V') {
            pos += 1;
            ReturnType::Void
        } else {
            let (ty, next) = parse_type_at(descriptor, pos)?;
            pos = next;
            ReturnType::Type(ty)
        };

        if pos != bytes.len() {
            return Err(DescriptorError::TrailingCharacters {
                descriptor: descriptor.to_string(),
                offset: pos,
            });
        }

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }

    /// Frame words taken by the declared parameters (receiver excluded)
    pub fn parameter_words(&self) -> usize {
        self.parameters.iter().map(FieldType::word_size).sum()
    }

    /// Parameter descriptor tokens, in order
    pub fn parameter_descriptors(&self) -> Vec<String> {
        self.parameters.iter().map(FieldType::descriptor).collect()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.parameters {
            f.write_str(&param.descriptor())?;
        }
        write!(f, "){}", self.return_type)
    }
}

/// Parse a complete field descriptor such as `[Ljava/lang/Object;`
pub fn parse_field_descriptor(descriptor: &str) -> Result<FieldType, DescriptorError> {
    let (ty, next) = parse_type_at(descriptor, 0)?;
    if next != descriptor.len() {
        return Err(DescriptorError::TrailingCharacters {
            descriptor: descriptor.to_string(),
            offset: next,
        });
    }
    Ok(ty)
}

/// Word count of a method descriptor's parameters
pub fn parameter_words(descriptor: &str) -> Result<usize, DescriptorError> {
    Ok(MethodDescriptor::parse(descriptor)?.parameter_words())
}

/// Convert an internal class name (`java/lang/String`, `[I`) into the
/// descriptor the class loader expects (`Ljava/lang/String;`, `[I`).
pub fn class_name_to_descriptor(internal_name: &str) -> String {
    if internal_name.starts_with('[') {
        internal_name.to_string()
    } else {
        format!("L{};", internal_name)
    }
}

/// Parse a single field type starting at `pos`.
/// Returns the type and the position just past it.
fn parse_type_at(descriptor: &str, pos: usize) -> Result<(FieldType, usize), DescriptorError> {
    let bytes = descriptor.as_bytes();
    let mut dims = 0;
    let mut pos = pos;
    while bytes.get(pos) == Some(&b'[') {
        dims += 1;
        pos += 1;
    }
    if dims > MAX_ARRAY_DIMENSIONS {
        return Err(DescriptorError::TooManyDimensions(descriptor.to_string()));
    }

    let Some(&b) = bytes.get(pos) else {
        return Err(DescriptorError::UnexpectedEnd {
            descriptor: descriptor.to_string(),
            offset: pos,
        });
    };

    let (mut ty, next) = match b {
        b'B' => (FieldType::Byte, pos + 1),
        b'C' => (FieldType::Char, pos + 1),
        b'D' => (FieldType::Double, pos + 1),
        b'F' => (FieldType::Float, pos + 1),
        b'I' => (FieldType::Int, pos + 1),
        b'J' => (FieldType::Long, pos + 1),
        b'S' => (FieldType::Short, pos + 1),
        b'Z' => (FieldType::Boolean, pos + 1),
        b'L' => {
            let start = pos + 1;
            let Some(len) = descriptor[start..].find(';') else {
                return Err(DescriptorError::UnexpectedEnd {
                    descriptor: descriptor.to_string(),
                    offset: descriptor.len(),
                });
            };
            if len == 0 {
                return Err(DescriptorError::InvalidChar {
                    descriptor: descriptor.to_string(),
                    offset: start,
                    found: ';',
                });
            }
            (
                FieldType::Reference(descriptor[start..start + len].to_string()),
                start + len + 1,
            )
        }
        b'V' => {
            return Err(DescriptorError::VoidNotAllowed {
                descriptor: descriptor.to_string(),
                offset: pos,
            })
        }
        _ => {
            return Err(DescriptorError::InvalidChar {
                descriptor: descriptor.to_string(),
                offset: pos,
                found: descriptor[pos..].chars().next().unwrap_or('?'),
            })
        }
    };

    for _ in 0..dims {
        ty = FieldType::Array(Box::new(ty));
    }
    Ok((ty, next))
}
