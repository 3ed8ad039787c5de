//! Error types returned by every OSAL operation.
//!
//! All registry, timebase and timer operations return
//! `Result<_, OsalError>` to their immediate caller. Nothing in this crate
//! retries a failed operation on the caller's behalf; the only internal retry
//! is transient slot contention inside an object table, which is never
//! surfaced.
//!
//! # Error Groups
//!
//! Each [`OsalError`] belongs to an [`ErrorGroup`]:
//!
//! - [`BadArg`]: Invalid arguments (stale IDs, bad names, bad times)
//! - [`SysCap`]: Capacity exhausted (object table full)
//! - [`SysInv`]: Operation not valid in the current object state
//! - [`SysPlat`]: Platform adapter failures and missing capabilities
//!
//! [`BadArg`]: ErrorGroup::BadArg
//! [`SysCap`]: ErrorGroup::SysCap
//! [`SysInv`]: ErrorGroup::SysInv
//! [`SysPlat`]: ErrorGroup::SysPlat

mod error_group;

pub use self::error_group::ErrorGroup;

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

// -----------------------------------------------------------------------------
// OSAL Error
// -----------------------------------------------------------------------------

/// Error type returned from failed OSAL operations.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum OsalError {
  /// The ID is stale, out of range, or names an object of another kind.
  InvalidId,
  /// An argument is out of range or otherwise malformed.
  InvalidArgument,
  /// The name exceeds the configured maximum length.
  NameTooLong,
  /// Another object of the same kind already uses the name.
  NameTaken,
  /// No object of the requested kind has the name.
  NameNotFound,
  /// The object table is full.
  NoFreeSlots,
  /// The object still has dependents and cannot be deleted.
  ResourceBusy,
  /// The object, or the calling context, does not permit the operation.
  IncorrectObjState,
  /// A bounded wait expired.
  Timeout,
  /// The platform adapter lacks the requested capability.
  NotImplemented,
  /// The platform adapter reported an unclassified failure.
  Internal,
}

impl OsalError {
  /// Returns the group this error belongs to.
  #[inline]
  pub const fn group(&self) -> ErrorGroup {
    match self {
      Self::InvalidId => ErrorGroup::BadArg,
      Self::InvalidArgument => ErrorGroup::BadArg,
      Self::NameTooLong => ErrorGroup::BadArg,
      Self::NameTaken => ErrorGroup::BadArg,
      Self::NameNotFound => ErrorGroup::BadArg,
      Self::NoFreeSlots => ErrorGroup::SysCap,
      Self::ResourceBusy => ErrorGroup::SysInv,
      Self::IncorrectObjState => ErrorGroup::SysInv,
      Self::Timeout => ErrorGroup::SysInv,
      Self::NotImplemented => ErrorGroup::SysPlat,
      Self::Internal => ErrorGroup::SysPlat,
    }
  }

  #[inline]
  const fn message(&self) -> &'static str {
    match self {
      Self::InvalidId => "invalid object id",
      Self::InvalidArgument => "invalid argument",
      Self::NameTooLong => "name too long",
      Self::NameTaken => "name taken",
      Self::NameNotFound => "name not found",
      Self::NoFreeSlots => "no free slots",
      Self::ResourceBusy => "resource busy",
      Self::IncorrectObjState => "incorrect object state",
      Self::Timeout => "timed out",
      Self::NotImplemented => "not implemented",
      Self::Internal => "internal error",
    }
  }
}

impl Display for OsalError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "[osal]: {}: {}", self.group(), self.message())
  }
}

impl Error for OsalError {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
