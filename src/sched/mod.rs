//! Timebase service loops.
//!
//! Every timebase owns one dedicated thread that blocks on its tick channel,
//! advances the timebase's free-run counter and invokes due timer callbacks.
//! A [`ServiceHandle`] is the owning side of that thread.

mod service;

pub(crate) use self::service::ServiceHandle;
pub(crate) use self::service::current_timebase;

/// Messages delivered to a service loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
  /// A tick covering the given number of microseconds, zero meaning one
  /// nominal interval.
  Tick(u32),
  /// Stop the loop.
  Quit,
}
