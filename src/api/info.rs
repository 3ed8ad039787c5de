use crate::core::CreatorId;
use crate::core::ObjectId;
use crate::core::ObjectKind;
use crate::core::TimerFlags;
use crate::platform::SyncMode;

/// Properties common to objects of every kind.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ObjectInfo {
  pub id: ObjectId,
  pub kind: ObjectKind,
  pub name: String,
  pub creator: CreatorId,
}

/// Snapshot of a timebase.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct TimeBaseInfo {
  pub name: String,
  pub creator: CreatorId,
  pub sync: SyncMode,
  /// Expected tick granularity reported by the tick source, in microseconds.
  pub accuracy: u32,
  /// Total time accounted by the service loop, in microseconds.
  pub freerun_time: u64,
  /// Number of ticks processed so far.
  pub ticks: u64,
  pub nominal_start_time: u32,
  pub nominal_interval_time: u32,
  /// Number of timers attached.
  pub timers: usize,
  /// `true` if the service loop terminated abnormally.
  pub faulted: bool,
}

/// Snapshot of a timer callback.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct TimerInfo {
  pub name: String,
  pub creator: CreatorId,
  pub timebase: ObjectId,
  pub start_time: u32,
  pub interval_time: u32,
  /// Time until the next firing; zero while the timer is idle.
  pub wait_time: u32,
  /// Number of whole periods skipped while catching up a late timer.
  pub backlog_resets: u32,
  pub accuracy: u32,
  /// How the timer was created.
  pub flags: TimerFlags,
}
