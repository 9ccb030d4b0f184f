//! Shared member model
//!
//! Fields and methods carry the same header: declaring class, flags, name,
//! descriptor, attributes and a slot in the declaring class's member table.
//! [`MemberInfo`] holds that header; the [`Member`] trait exposes it with
//! provided accessors so `Field` and `Method` only supply `info()`.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::attributes::{find_attribute, find_attributes, names, Attribute};
use crate::class::ClassRef;
use crate::classfile::MemberRecord;
use crate::flags::AccessFlags;
use crate::{LinkError, LinkResult};

/// Slot value reported before the class loader assigns one
pub const UNASSIGNED_SLOT: i32 = -1;

/// Header data common to fields and methods
#[derive(Debug)]
pub struct MemberInfo {
    owning_class: ClassRef,
    access_flags: AccessFlags,
    name: String,
    raw_descriptor: String,
    attributes: Vec<Attribute>,
    slot: OnceCell<u16>,
}

impl MemberInfo {
    /// Create a member header with no slot assigned
    pub fn new(
        owning_class: ClassRef,
        access_flags: AccessFlags,
        name: impl Into<String>,
        raw_descriptor: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            owning_class,
            access_flags,
            name: name.into(),
            raw_descriptor: raw_descriptor.into(),
            attributes,
            slot: OnceCell::new(),
        }
    }

    /// Create a member header from a record read out of a class file
    pub fn from_record(owning_class: ClassRef, record: MemberRecord) -> Self {
        Self::new(
            owning_class,
            AccessFlags::from_raw(record.access_flags),
            record.name,
            record.descriptor,
            record.attributes,
        )
    }

    /// Declaring class
    pub fn owning_class(&self) -> &ClassRef {
        &self.owning_class
    }

    /// Simple name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor as written in the constant pool
    pub fn raw_descriptor(&self) -> &str {
        &self.raw_descriptor
    }

    /// Access flags
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    /// Attributes, in class-file order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub(crate) fn force_native(&mut self) {
        self.access_flags.insert(AccessFlags::NATIVE);
    }
}

/// A field or method of a loaded class
pub trait Member {
    /// The shared member header
    fn info(&self) -> &MemberInfo;

    /// Declaring class
    fn owning_class(&self) -> &ClassRef {
        &self.info().owning_class
    }

    /// Simple name (`counter`, `<init>`)
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Descriptor exactly as it appears in the constant pool
    fn raw_descriptor(&self) -> &str {
        &self.info().raw_descriptor
    }

    /// Access flags
    fn access_flags(&self) -> AccessFlags {
        self.info().access_flags
    }

    /// Index in the declaring class's member table, or `-1` until assigned
    fn slot(&self) -> i32 {
        self.info()
            .slot
            .get()
            .map_or(UNASSIGNED_SLOT, |slot| i32::from(*slot))
    }

    /// Assign the member's slot. Only the class loader calls this, once;
    /// a second assignment fails and keeps the first value.
    fn assign_slot(&self, slot: u16) -> LinkResult<()> {
        let info = self.info();
        info.slot.set(slot).map_err(|_| {
            LinkError::ContractViolation(format!(
                "slot of {}.{} already assigned ({})",
                info.owning_class.internal_name(),
                info.name,
                self.slot()
            ))
        })?;
        trace!(
            class = %info.owning_class.internal_name(),
            member = %info.name,
            slot,
            "slot assigned"
        );
        Ok(())
    }

    /// All attributes, in class-file order
    fn attributes(&self) -> &[Attribute] {
        &self.info().attributes
    }

    /// First attribute with the given name
    fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.info().attributes, name)
    }

    /// Every attribute with the given name
    fn attributes_named(&self, name: &str) -> Vec<&Attribute> {
        find_attributes(&self.info().attributes, name)
    }

    /// Declared `static`
    fn is_static(&self) -> bool {
        self.access_flags().is_static()
    }

    /// Declared `native` or trapped by a builtin
    fn is_native(&self) -> bool {
        self.access_flags().is_native()
    }

    /// Declared `abstract`
    fn is_abstract(&self) -> bool {
        self.access_flags().is_abstract()
    }

    /// Declared `synchronized`
    fn is_synchronized(&self) -> bool {
        self.access_flags().is_synchronized()
    }

    /// Generic signature from the `Signature` attribute
    fn generic_signature(&self) -> Option<&str> {
        match self.attribute(names::SIGNATURE) {
            Some(Attribute::Signature(sig)) => Some(sig),
            _ => None,
        }
    }

    /// Raw `RuntimeVisibleAnnotations` payload
    fn annotations(&self) -> Option<Arc<[u8]>> {
        self.attribute(names::RUNTIME_VISIBLE_ANNOTATIONS)
            .and_then(Attribute::annotation_bytes)
    }
}
