use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use triomphe::Arc;

use crate::core::CallbackRing;
use crate::core::ObjectId;
use crate::error::OsalError;
use crate::platform::SyncMode;
use crate::platform::TickSource;
use crate::sched::ServiceHandle;

// -----------------------------------------------------------------------------
// TimeBase State
// -----------------------------------------------------------------------------

/// Mutable state of a timebase, guarded by the timebase list lock.
#[derive(Debug)]
pub(crate) struct TimeBaseState {
  /// Timer callbacks attached to this timebase.
  pub(crate) ring: CallbackRing,
  /// Elapsed-time counter advanced only by the service loop.
  pub(crate) freerun_time: u64,
  /// Number of ticks processed by the service loop.
  pub(crate) ticks: u64,
  pub(crate) nominal_start_time: u32,
  pub(crate) nominal_interval_time: u32,
  /// Set once deletion has begun; no further timers may attach.
  pub(crate) closed: bool,
  /// Timer whose callback the service loop is currently invoking.
  pub(crate) active: Option<ObjectId>,
}

// -----------------------------------------------------------------------------
// TimeBase Shared
// -----------------------------------------------------------------------------

/// State shared between a timebase record, its timers, and its service loop.
pub(crate) struct TimeBaseShared {
  id: ObjectId,
  state: Mutex<TimeBaseState>,
  idle: Condvar,
  accuracy: AtomicU32,
  faulted: AtomicBool,
}

impl TimeBaseShared {
  pub(crate) fn new(id: ObjectId, capacity: usize) -> Self {
    Self {
      id,
      state: Mutex::new(TimeBaseState {
        ring: CallbackRing::new(capacity),
        freerun_time: 0,
        ticks: 0,
        nominal_start_time: 0,
        nominal_interval_time: 0,
        closed: false,
        active: None,
      }),
      idle: Condvar::new(),
      accuracy: AtomicU32::new(0),
      faulted: AtomicBool::new(false),
    }
  }

  #[inline]
  pub(crate) const fn id(&self) -> ObjectId {
    self.id
  }

  /// Acquires the timebase list lock.
  #[inline]
  pub(crate) fn lock(&self) -> MutexGuard<'_, TimeBaseState> {
    self.state.lock()
  }

  #[inline]
  pub(crate) fn accuracy(&self) -> u32 {
    self.accuracy.load(Ordering::Acquire)
  }

  #[inline]
  pub(crate) fn set_accuracy(&self, value: u32) {
    self.accuracy.store(value, Ordering::Release);
  }

  /// Returns `true` if the service loop terminated abnormally.
  #[inline]
  pub(crate) fn is_faulted(&self) -> bool {
    self.faulted.load(Ordering::Acquire)
  }

  #[inline]
  pub(crate) fn mark_faulted(&self) {
    self.faulted.store(true, Ordering::Release);
  }

  /// Clears the in-flight callback marker and wakes any waiting deleters.
  pub(crate) fn finish_callback(&self) {
    self.state.lock().active = None;
    self.idle.notify_all();
  }

  /// Blocks until the callback of timer `id` is no longer in flight.
  ///
  /// The list lock is released while waiting.
  pub(crate) fn wait_inactive(&self, guard: &mut MutexGuard<'_, TimeBaseState>, id: ObjectId) {
    while guard.active == Some(id) && !self.is_faulted() {
      self.idle.wait(guard);
    }
  }
}

impl Debug for TimeBaseShared {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TimeBaseShared")
      .field("id", &self.id)
      .field("accuracy", &self.accuracy())
      .field("faulted", &self.is_faulted())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// TimeBase
// -----------------------------------------------------------------------------

/// Payload of a timebase object.
pub(crate) struct TimeBase {
  sync: SyncMode,
  shared: Arc<TimeBaseShared>,
  source: Mutex<Option<Box<dyn TickSource>>>,
  service: Mutex<Option<ServiceHandle>>,
}

impl TimeBase {
  pub(crate) fn new(
    sync: SyncMode,
    shared: Arc<TimeBaseShared>,
    source: Box<dyn TickSource>,
    service: ServiceHandle,
  ) -> Self {
    Self {
      sync,
      shared,
      source: Mutex::new(Some(source)),
      service: Mutex::new(Some(service)),
    }
  }

  #[inline]
  pub(crate) const fn sync(&self) -> &SyncMode {
    &self.sync
  }

  #[inline]
  pub(crate) const fn shared(&self) -> &Arc<TimeBaseShared> {
    &self.shared
  }

  /// Reprograms the tick source and records the new nominal schedule.
  pub(crate) fn program(&self, start: u32, interval: u32) -> Result<(), OsalError> {
    let mut source: MutexGuard<'_, Option<Box<dyn TickSource>>> = self.source.lock();

    let Some(source) = source.as_mut() else {
      return Err(OsalError::InvalidId);
    };

    source.program(start, interval)?;

    let mut state: MutexGuard<'_, TimeBaseState> = self.shared.lock();

    state.nominal_start_time = start;
    state.nominal_interval_time = interval;

    Ok(())
  }

  /// Stops the service loop and hands the tick source back to the platform.
  ///
  /// Returns `false` if the service loop had faulted.
  pub(crate) fn shutdown(&self) -> bool {
    let clean: bool = match self.service.lock().take() {
      Some(service) => service.stop(),
      None => true,
    };

    if let Some(mut source) = self.source.lock().take() {
      source.release();
    }

    clean
  }
}

impl Debug for TimeBase {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TimeBase")
      .field("sync", &self.sync)
      .field("shared", &self.shared)
      .finish_non_exhaustive()
  }
}
