//! Platform adapter boundary.
//!
//! The core never touches a clock, timer interrupt or signal directly.
//! Instead, each timebase asks the [`Platform`] for a [`TickSource`] when its
//! service loop starts and hands it a [`TickSink`] through which the source
//! delivers ticks.
//!
//! # Adapters
//!
//! - [`HostPlatform`]: Real monotonic clock threads and named pulse lines
//! - [`SimPlatform`]: Deterministic, manually driven ticks for tests

mod host;
mod sim;

pub use self::host::HostPlatform;
pub use self::host::PulseLine;
pub use self::sim::SimPlatform;

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::ObjectId;
use crate::error::OsalError;
use crate::sched::Signal;

// -----------------------------------------------------------------------------
// Sync Mode
// -----------------------------------------------------------------------------

/// How a timebase obtains its ticks.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum SyncMode {
  /// The platform generates ticks at the cadence set with `timebase_set`.
  InternalFreeRun,
  /// Ticks come from the named external signal line.
  ExternalSync(String),
}

impl SyncMode {
  /// Creates an external sync mode driven by the named line.
  #[inline]
  pub fn external(line: impl Into<String>) -> Self {
    Self::ExternalSync(line.into())
  }

  /// Returns `true` if the tick cadence is not caller-controlled.
  #[inline]
  pub const fn is_external(&self) -> bool {
    matches!(self, Self::ExternalSync(_))
  }
}

impl Display for SyncMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::InternalFreeRun => f.write_str("internal"),
      Self::ExternalSync(line) => write!(f, "external({line})"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tick Sink
// -----------------------------------------------------------------------------

/// Notification channel from a tick source to one service loop.
///
/// Posting never blocks, so a sink may be driven from any thread, including
/// one standing in for an interrupt handler.
#[derive(Clone)]
pub struct TickSink {
  timebase: ObjectId,
  inner: UnboundedSender<Signal>,
}

impl TickSink {
  #[inline]
  pub(crate) const fn new(timebase: ObjectId, inner: UnboundedSender<Signal>) -> Self {
    Self { timebase, inner }
  }

  /// Returns the timebase this sink delivers to.
  #[inline]
  pub const fn timebase(&self) -> ObjectId {
    self.timebase
  }

  /// Delivers one tick covering `elapsed` microseconds.
  ///
  /// An `elapsed` of zero stands for one nominal interval of the timebase.
  /// Returns `false` if the service loop is gone.
  #[inline]
  pub fn post(&self, elapsed: u32) -> bool {
    self.inner.send(Signal::Tick(elapsed)).is_ok()
  }

  /// Returns `true` if the service loop is gone.
  #[inline]
  pub fn is_closed(&self) -> bool {
    self.inner.is_closed()
  }
}

impl Debug for TickSink {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TickSink")
      .field("timebase", &self.timebase)
      .field("closed", &self.is_closed())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tick Request
// -----------------------------------------------------------------------------

/// Everything a platform needs to attach a tick source to a timebase.
#[derive(Debug)]
#[non_exhaustive]
pub struct TickRequest<'a> {
  pub timebase: ObjectId,
  pub name: &'a str,
  pub mode: &'a SyncMode,
  pub sink: TickSink,
}

// -----------------------------------------------------------------------------
// Tick Source
// -----------------------------------------------------------------------------

/// A source of ticks attached to exactly one timebase.
pub trait TickSource: Send {
  /// Expected tick granularity, in microseconds.
  fn accuracy(&self) -> u32;

  /// Reprograms the source to tick after `start` and then every `interval`
  /// microseconds. `(0, 0)` stops the source.
  fn program(&mut self, start: u32, interval: u32) -> Result<(), OsalError> {
    let _ = (start, interval);
    Err(OsalError::NotImplemented)
  }

  /// Detaches the source. No further ticks are posted afterwards.
  fn release(&mut self) {}
}

// -----------------------------------------------------------------------------
// Platform
// -----------------------------------------------------------------------------

/// Capabilities the core requires from the host environment.
pub trait Platform: Send + Sync + 'static {
  /// Short name used in diagnostics.
  fn name(&self) -> &'static str {
    "platform"
  }

  /// Attaches a tick source to the timebase described by `request`.
  ///
  /// Called on the service loop thread of the timebase before it starts
  /// waiting for ticks.
  fn acquire_tick_source(
    &self,
    request: TickRequest<'_>,
  ) -> Result<Box<dyn TickSource>, OsalError>;
}
