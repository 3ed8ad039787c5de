use bitflags::bitflags;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use triomphe::Arc;

use crate::core::ObjectId;
use crate::core::TimeBaseShared;

/// Callback invoked by a service loop when a timer is due.
///
/// Receives the ID of the timer that fired.
pub(crate) type TimerCallback = std::sync::Arc<dyn Fn(ObjectId) + Send + Sync + 'static>;

bitflags! {
  /// Flags describing how a timer was created.
  #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
  pub struct TimerFlags: u32 {
    /// The timer owns an implicitly created timebase of the same name.
    const DEDICATED_TIMEBASE = 1 << 0;
  }
}

/// Payload of a timer callback object.
pub(crate) struct TimerCb {
  timebase: ObjectId,
  shared: Arc<TimeBaseShared>,
  flags: TimerFlags,
}

impl TimerCb {
  #[inline]
  pub(crate) fn new(shared: Arc<TimeBaseShared>, flags: TimerFlags) -> Self {
    Self {
      timebase: shared.id(),
      shared,
      flags,
    }
  }

  /// Returns the ID of the timebase this timer is attached to.
  #[inline]
  pub(crate) const fn timebase(&self) -> ObjectId {
    self.timebase
  }

  #[inline]
  pub(crate) const fn shared(&self) -> &Arc<TimeBaseShared> {
    &self.shared
  }

  #[inline]
  pub(crate) const fn flags(&self) -> TimerFlags {
    self.flags
  }

  #[inline]
  pub(crate) const fn is_dedicated(&self) -> bool {
    self.flags.contains(TimerFlags::DEDICATED_TIMEBASE)
  }
}

impl Debug for TimerCb {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TimerCb")
      .field("timebase", &self.timebase)
      .field("flags", &self.flags)
      .finish_non_exhaustive()
  }
}
