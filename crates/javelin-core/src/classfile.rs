//! Class-file input interfaces
//!
//! Constant-pool and attribute parsing live outside this crate. Member
//! construction consumes them through [`ConstantPool`] and
//! [`AttributeParser`], reading the fixed member header itself with a
//! [`ClassReader`] positioned at the start of a `field_info`/`method_info`
//! record.

use thiserror::Error;

use crate::attributes::Attribute;

/// Errors that can occur while reading a member record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassReadError {
    /// Unexpected end of the class-file stream
    #[error("Unexpected end of class file at offset {0}")]
    UnexpectedEnd(usize),

    /// Constant-pool index that does not name a UTF-8 entry
    #[error("Constant pool entry {0} is not a UTF-8 string")]
    NotUtf8(u16),

    /// Attribute payload rejected by the attribute parser
    #[error("Malformed {name} attribute: {reason}")]
    MalformedAttribute {
        /// Attribute name
        name: String,
        /// What was wrong
        reason: String,
    },
}

/// Big-endian reader over class-file bytes
pub struct ClassReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ClassReader<'a> {
    /// Create a new reader at offset 0
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Read a 16-bit unsigned integer (big-endian)
    pub fn read_u16(&mut self) -> Result<u16, ClassReadError> {
        if self.position + 2 > self.buffer.len() {
            return Err(ClassReadError::UnexpectedEnd(self.position));
        }
        let bytes = [self.buffer[self.position], self.buffer[self.position + 1]];
        self.position += 2;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read a 32-bit unsigned integer (big-endian)
    pub fn read_u32(&mut self) -> Result<u32, ClassReadError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Borrow the next `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ClassReadError> {
        if self.position + count > self.buffer.len() {
            return Err(ClassReadError::UnexpectedEnd(self.position));
        }
        let bytes = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }
}

/// Resolved constant pool of the class being loaded
pub trait ConstantPool {
    /// The UTF-8 string at `index`, if that entry is a UTF-8 constant
    fn utf8(&self, index: u16) -> Option<&str>;

    /// The UTF-8 string at `index`, or a read error
    fn expect_utf8(&self, index: u16) -> Result<&str, ClassReadError> {
        self.utf8(index).ok_or(ClassReadError::NotUtf8(index))
    }
}

/// Parser for a member's attribute table
pub trait AttributeParser {
    /// Read `attributes_count` followed by that many attributes
    fn parse_attributes(
        &self,
        reader: &mut ClassReader<'_>,
        pool: &dyn ConstantPool,
    ) -> Result<Vec<Attribute>, ClassReadError>;
}

/// Header fields of a `field_info`/`method_info` record
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    /// Raw `access_flags`
    pub access_flags: u16,
    /// Name from the constant pool
    pub name: String,
    /// Descriptor from the constant pool
    pub descriptor: String,
    /// Parsed attributes, in class-file order
    pub attributes: Vec<Attribute>,
}

impl MemberRecord {
    /// Read one member record from `reader`
    pub fn read(
        reader: &mut ClassReader<'_>,
        pool: &dyn ConstantPool,
        parser: &dyn AttributeParser,
    ) -> Result<Self, ClassReadError> {
        let access_flags = reader.read_u16()?;
        let name = pool.expect_utf8(reader.read_u16()?)?.to_string();
        let descriptor = pool.expect_utf8(reader.read_u16()?)?.to_string();
        let attributes = parser.parse_attributes(reader, pool)?;
        Ok(MemberRecord {
            access_flags,
            name,
            descriptor,
            attributes,
        })
    }
}
