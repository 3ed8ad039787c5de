use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Error category indicating the nature of an [`OsalError`].
///
/// Groups let callers and log sinks react to a whole class of failures
/// without matching every variant.
///
/// [`OsalError`]: crate::error::OsalError
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorGroup {
  /// Invalid function argument or parameter.
  ///
  /// Indicates the caller provided data that violates function preconditions.
  BadArg,
  /// System capacity limit exceeded.
  ///
  /// Indicates resource exhaustion such as a full object table.
  SysCap,
  /// Invalid system operation or state.
  ///
  /// Indicates an operation that cannot be performed in the current system state.
  SysInv,
  /// Failure reported by the platform adapter.
  SysPlat,
}

impl Display for ErrorGroup {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::BadArg => f.write_str("(BadArg) errors were found with the given argument(s)"),
      Self::SysCap => f.write_str("(SysCap) a system limit has been reached"),
      Self::SysInv => f.write_str("(SysInv) the object is not in a usable state"),
      Self::SysPlat => f.write_str("(SysPlat) the platform adapter reported a failure"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::error::ErrorGroup;

  #[test]
  fn test_display() {
    let badarg: String = format!("{}", ErrorGroup::BadArg);
    let syscap: String = format!("{}", ErrorGroup::SysCap);
    let sysinv: String = format!("{}", ErrorGroup::SysInv);
    let sysplat: String = format!("{}", ErrorGroup::SysPlat);

    assert!(badarg.starts_with("(BadArg)"));
    assert!(syscap.starts_with("(SysCap)"));
    assert!(sysinv.starts_with("(SysInv)"));
    assert!(sysplat.starts_with("(SysPlat)"));
  }
}
