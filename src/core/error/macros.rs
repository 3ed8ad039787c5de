//! Internal error handling macros.

/// Displays a system error message and aborts the program.
///
/// Use this for unrecoverable errors that indicate bugs in this crate itself,
/// such as a corrupted callback ring. The program prints a diagnostic message
/// and immediately aborts without unwinding.
///
/// # Examples
///
/// ```ignore
/// if node.next == index {
///   fatal!("self-linked node in callback ring");
/// }
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

pub(crate) use fatal;
