use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::core::ObjectKind;

/// Identifier uniquely naming a live object of any kind.
///
/// Object IDs are 32-bit tagged values that encode:
///
/// - **Kind**: Resource kind tag (8 bits)
/// - **Serial**: Per-table serial number (24 bits)
///
/// The slot index of an object is its serial modulo the capacity of the
/// owning table. When a slot is reused its serial advances by the table
/// capacity, so the slot index is preserved while every stale ID held by a
/// caller stops matching.
///
/// # Format
///
/// IDs display as `#OID<kind.serial>`.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId {
  bits: u32,
}

impl ObjectId {
  /// Bit width of the kind tag field.
  pub(crate) const KIND_BITS: u32 = 8;

  /// Bit width of the serial number field.
  pub(crate) const SERIAL_BITS: u32 = u32::BITS - Self::KIND_BITS;

  /// Bitmask for extracting the serial field.
  pub(crate) const SERIAL_MASK: u32 = (1 << Self::SERIAL_BITS) - 1;

  /// Largest representable serial number.
  pub(crate) const MAX_SERIAL: u32 = Self::SERIAL_MASK;

  /// Sentinel value representing an undefined or invalid ID.
  pub const UNDEFINED: Self = Self::from_bits(0);

  /// Creates an ID for the given kind and serial number.
  #[inline]
  pub(crate) const fn new(kind: ObjectKind, serial: u32) -> Self {
    debug_assert!(serial <= Self::MAX_SERIAL);

    Self {
      bits: ((kind.tag() as u32) << Self::SERIAL_BITS) | (serial & Self::SERIAL_MASK),
    }
  }

  /// Creates an object ID from its raw encoded bits.
  #[inline]
  pub const fn from_bits(bits: u32) -> Self {
    Self { bits }
  }

  /// Converts this ID into its raw encoded bits.
  #[inline]
  pub const fn into_bits(self) -> u32 {
    self.bits
  }

  /// Returns the resource kind encoded in this ID.
  ///
  /// Returns `None` for [`UNDEFINED`] and unknown tags.
  ///
  /// [`UNDEFINED`]: Self::UNDEFINED
  #[inline]
  pub const fn kind(self) -> Option<ObjectKind> {
    ObjectKind::from_tag((self.bits >> Self::SERIAL_BITS) as u8)
  }

  /// Returns the serial number encoded in this ID.
  #[inline]
  pub const fn serial(self) -> u32 {
    self.bits & Self::SERIAL_MASK
  }

  /// Returns `true` if this ID carries a known kind tag.
  #[inline]
  pub const fn is_defined(self) -> bool {
    self.kind().is_some()
  }
}

impl Default for ObjectId {
  #[inline]
  fn default() -> Self {
    Self::UNDEFINED
  }
}

impl Debug for ObjectId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for ObjectId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self.kind() {
      Some(kind) => write!(f, "#OID<{}.{}>", kind, self.serial()),
      None => write!(f, "#OID<undefined>"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
