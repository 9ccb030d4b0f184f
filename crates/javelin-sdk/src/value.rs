//! Word-sized value representation shared by the VM and native methods
//!
//! A `Value` is one entry of a frame's local-variable array or of a native
//! argument list. `long` and `double` values are stored in a single `Value`
//! but occupy two words in the frame layout; the second word holds a
//! null placeholder.
//!
//! # Layout
//!
//! ```text
//! tag (u8) | data (u64)
//!   Null      0   unused
//!   Int       1   i32 sign-extended
//!   Long      2   i64 bits
//!   Float     3   f32 bits
//!   Double    4   f64 bits
//!   Ref       5   heap handle id
//! ```

use std::fmt;

/// Opaque handle to an object living on the VM heap.
///
/// The heap itself is owned by the embedding VM; this crate only moves
/// handles around.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Wrap a raw heap handle id
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        ObjectRef(id)
    }

    /// Get the raw heap handle id
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:#x})", self.0)
    }
}

const TAG_NULL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_LONG: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_DOUBLE: u8 = 4;
const TAG_REF: u8 = 5;

/// Tagged VM value
#[derive(Clone, Copy, PartialEq)]
pub struct Value {
    tag: u8,
    data: u64,
}

impl Value {
    /// Create a null value (also used as the placeholder word after a wide value)
    #[inline]
    pub const fn null() -> Self {
        Value {
            tag: TAG_NULL,
            data: 0,
        }
    }

    /// Create an `int` value; `boolean`, `byte`, `char` and `short` widen to it
    #[inline]
    pub const fn int(i: i32) -> Self {
        Value {
            tag: TAG_INT,
            data: i as i64 as u64,
        }
    }

    /// Create a `boolean` value (stored as int 0/1)
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Self::int(b as i32)
    }

    /// Create a `long` value
    #[inline]
    pub const fn long(l: i64) -> Self {
        Value {
            tag: TAG_LONG,
            data: l as u64,
        }
    }

    /// Create a `float` value
    #[inline]
    pub fn float(f: f32) -> Self {
        Value {
            tag: TAG_FLOAT,
            data: f.to_bits() as u64,
        }
    }

    /// Create a `double` value
    #[inline]
    pub fn double(d: f64) -> Self {
        Value {
            tag: TAG_DOUBLE,
            data: d.to_bits(),
        }
    }

    /// Create a reference value
    #[inline]
    pub const fn object(obj: ObjectRef) -> Self {
        Value {
            tag: TAG_REF,
            data: obj.raw(),
        }
    }

    /// Check if this is a null value
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.tag == TAG_NULL
    }

    /// Check if this value occupies two words in a frame
    #[inline]
    pub const fn is_wide(&self) -> bool {
        self.tag == TAG_LONG || self.tag == TAG_DOUBLE
    }

    /// Get as int if this is an int
    pub fn as_int(&self) -> Option<i32> {
        if self.tag == TAG_INT {
            Some(self.data as i32)
        } else {
            None
        }
    }

    /// Get as boolean if this is an int holding 0 or 1
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_int() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        }
    }

    /// Get as long if this is a long
    pub fn as_long(&self) -> Option<i64> {
        if self.tag == TAG_LONG {
            Some(self.data as i64)
        } else {
            None
        }
    }

    /// Get as float if this is a float
    pub fn as_float(&self) -> Option<f32> {
        if self.tag == TAG_FLOAT {
            Some(f32::from_bits(self.data as u32))
        } else {
            None
        }
    }

    /// Get as double if this is a double
    pub fn as_double(&self) -> Option<f64> {
        if self.tag == TAG_DOUBLE {
            Some(f64::from_bits(self.data))
        } else {
            None
        }
    }

    /// Get as object reference if this is a non-null reference
    pub fn as_object(&self) -> Option<ObjectRef> {
        if self.tag == TAG_REF {
            Some(ObjectRef::from_raw(self.data))
        } else {
            None
        }
    }

    /// Get the type tag
    pub fn tag(&self) -> u8 {
        self.tag
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::object(obj)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            TAG_NULL => write!(f, "Value::Null"),
            TAG_INT => write!(f, "Value::Int({})", self.data as i32),
            TAG_LONG => write!(f, "Value::Long({})", self.data as i64),
            TAG_FLOAT => write!(f, "Value::Float({})", f32::from_bits(self.data as u32)),
            TAG_DOUBLE => write!(f, "Value::Double({})", f64::from_bits(self.data)),
            TAG_REF => write!(f, "Value::Ref({:#x})", self.data),
            _ => write!(f, "Value::Unknown(tag={}, data={})", self.tag, self.data),
        }
    }
}
