//! Member access flags

use bitflags::bitflags;

bitflags! {
    /// Access and property flags of a field or method.
    ///
    /// Field and method flags share bit positions; `VOLATILE`/`BRIDGE` and
    /// `TRANSIENT`/`VARARGS` are the same bits read in a field or method
    /// context respectively.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;       // Declared public; may be accessed from outside its package.
        const PRIVATE = 0x0002;      // Declared private; accessible only within the defining class.
        const PROTECTED = 0x0004;    // Declared protected; may be accessed within subclasses.
        const STATIC = 0x0008;       // Declared static.
        const FINAL = 0x0010;        // Declared final.
        const SYNCHRONIZED = 0x0020; // Invocation is wrapped by a monitor use.
        const VOLATILE = 0x0040;     // Field: cannot be cached.
        const BRIDGE = 0x0040;       // Method: compiler-generated bridge.
        const TRANSIENT = 0x0080;    // Field: not written by a persistent object manager.
        const VARARGS = 0x0080;      // Method: declared with variable arity.
        const NATIVE = 0x0100;       // Implemented outside bytecode.
        const ABSTRACT = 0x0400;     // No implementation provided.
        const STRICT = 0x0800;       // Floating-point mode is FP-strict.
        const SYNTHETIC = 0x1000;    // Not present in the source code.
        const ENUM = 0x4000;         // Field: element of an enum.
    }
}

#[allow(missing_docs)]
impl AccessFlags {
    /// Build from the raw `access_flags` item, keeping unknown bits
    pub fn from_raw(bits: u16) -> Self {
        Self::from_bits_retain(bits)
    }

    /// Raw bits as stored in the class file; reflection reports these as modifiers
    pub fn modifiers(self) -> u16 {
        self.bits()
    }

    #[inline]
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    #[inline]
    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[inline]
    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    #[inline]
    pub fn is_synchronized(self) -> bool {
        self.contains(Self::SYNCHRONIZED)
    }

    #[inline]
    pub fn is_varargs(self) -> bool {
        self.contains(Self::VARARGS)
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self.contains(Self::NATIVE)
    }

    #[inline]
    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    #[inline]
    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }
}
