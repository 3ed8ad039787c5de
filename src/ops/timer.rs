use parking_lot::MutexGuard;
use std::sync::Arc as StdArc;
use tracing::debug;
use triomphe::Arc;

use crate::api::TimerInfo;
use crate::core::ObjectId;
use crate::core::ObjectRecord;
use crate::core::RingNode;
use crate::core::TimeBase;
use crate::core::TimeBaseShared;
use crate::core::TimeBaseState;
use crate::core::TimerCallback;
use crate::core::TimerCb;
use crate::core::TimerFlags;
use crate::core::fatal;
use crate::error::OsalError;
use crate::ops::System;
use crate::ops::check_times;
use crate::ops::timebase_create;
use crate::ops::timebase_delete;
use crate::ops::timebase_set;
use crate::platform::SyncMode;
use crate::sched;

/// Attaches a new, idle timer to an existing timebase.
pub(crate) fn timer_add(
  system: &System,
  name: &str,
  timebase: ObjectId,
  callback: TimerCallback,
) -> Result<ObjectId, OsalError> {
  timer_attach(system, name, timebase, callback, TimerFlags::empty())
}

/// Creates a timer together with a dedicated free-running timebase of the
/// same name.
///
/// Returns the timer ID and the accuracy of its tick source.
pub(crate) fn timer_create(
  system: &System,
  name: &str,
  callback: TimerCallback,
) -> Result<(ObjectId, u32), OsalError> {
  let timebase: ObjectId = timebase_create(system, name, SyncMode::InternalFreeRun)?;

  match timer_attach(system, name, timebase, callback, TimerFlags::DEDICATED_TIMEBASE) {
    Ok(id) => {
      let accuracy: u32 = system.timebases.get(timebase)?.shared().accuracy();
      Ok((id, accuracy))
    }
    Err(error) => {
      if let Err(cleanup) = timebase_delete(system, timebase) {
        debug!(target: "osal", %timebase, error = %cleanup, "dedicated timebase leaked");
      }

      Err(error)
    }
  }
}

fn timer_attach(
  system: &System,
  name: &str,
  timebase: ObjectId,
  callback: TimerCallback,
  flags: TimerFlags,
) -> Result<ObjectId, OsalError> {
  let id: ObjectId = system.timers.create(name, |id| {
    let index: usize = system.timers.index_of(id)?;
    let record: Arc<ObjectRecord<TimeBase>> = system.timebases.get(timebase)?;
    let shared: &Arc<TimeBaseShared> = record.shared();

    {
      let mut state: MutexGuard<'_, TimeBaseState> = shared.lock();

      if state.closed {
        return Err(OsalError::InvalidId);
      }

      state.ring.insert_tail(index, id, callback);
    }

    Ok(TimerCb::new(Arc::clone(shared), flags))
  })?;

  debug!(target: "osal", %id, %timebase, name, "timer added");

  Ok(id)
}

/// Arms a timer to fire after `start` and then every `interval`.
///
/// A zero `start` fires first after one `interval`; a zero `interval` makes
/// the timer one-shot.
pub(crate) fn timer_set(
  system: &System,
  id: ObjectId,
  start: u32,
  interval: u32,
) -> Result<(), OsalError> {
  if start == 0 && interval == 0 {
    return Err(OsalError::InvalidArgument);
  }

  check_times(start, interval)?;

  let index: usize = system.timers.index_of(id)?;
  let record: Arc<ObjectRecord<TimerCb>> = system.timers.get(id)?;

  if record.is_dedicated() {
    timebase_set(system, record.timebase(), start, interval)?;
  }

  {
    let mut state: MutexGuard<'_, TimeBaseState> = record.shared().lock();

    let Some(node) = state.ring.get_mut(index, id) else {
      return Err(OsalError::InvalidId);
    };

    node.schedule.arm(start, interval);
  }

  debug!(target: "osal", %id, start, interval, "timer armed");

  Ok(())
}

/// Detaches a timer from its timebase and deletes it.
///
/// Unless called from the timer's own service loop, this waits for an
/// in-flight invocation of the callback to return, so the callback never runs
/// once this returns. From its own service loop it never waits: a timer that
/// another thread is already deleting reports [`OsalError::InvalidId`].
///
/// A dedicated timer is deleted together with its timebase, and neither is
/// touched while other timers are attached to that timebase.
pub(crate) fn timer_delete(system: &System, id: ObjectId) -> Result<(), OsalError> {
  let index: usize = system.timers.index_of(id)?;
  let record: Arc<ObjectRecord<TimerCb>> = system.timers.get(id)?;
  let context: Option<ObjectId> = sched::current_timebase();
  let own_loop: bool = context == Some(record.timebase());

  // The dedicated timebase would have to stop the very loop we are on.
  if record.is_dedicated() && context.is_some() {
    return Err(OsalError::IncorrectObjState);
  }

  // The callback may own the last handle to this instance, so it is dropped
  // only after every lock has been released.
  let mut removed: Option<RingNode> = None;

  let teardown = |timer: &ObjectRecord<TimerCb>| {
    let shared: &Arc<TimeBaseShared> = timer.shared();
    let mut state: MutexGuard<'_, TimeBaseState> = shared.lock();

    if timer.is_dedicated() {
      if state.ring.len() > 1 {
        return Err(OsalError::ResourceBusy);
      }

      // Nothing may attach between here and the timebase delete below.
      state.closed = true;
    }

    removed = state.ring.remove(index, id);

    if removed.is_none() {
      fatal!("timer missing from its timebase ring");
    }

    if !own_loop {
      shared.wait_inactive(&mut state, id);
    }

    Ok(())
  };

  if own_loop {
    system.timers.try_delete(id, teardown)?;
  } else {
    system.timers.delete(id, teardown)?;
  }

  drop(removed);

  debug!(target: "osal", %id, "timer deleted");

  if record.is_dedicated() {
    match timebase_delete(system, record.timebase()) {
      // Already deleted by a concurrent `timebase_delete` once the ring emptied.
      Ok(()) | Err(OsalError::InvalidId) => {}
      Err(error) => return Err(error),
    }
  }

  Ok(())
}

pub(crate) fn timer_get_id_by_name(system: &System, name: &str) -> Result<ObjectId, OsalError> {
  system.timers.lookup_by_name(name)
}

pub(crate) fn timer_get_info(system: &System, id: ObjectId) -> Result<TimerInfo, OsalError> {
  let index: usize = system.timers.index_of(id)?;
  let record: Arc<ObjectRecord<TimerCb>> = system.timers.get(id)?;
  let shared: &Arc<TimeBaseShared> = record.shared();
  let state: MutexGuard<'_, TimeBaseState> = shared.lock();

  let Some(node) = state.ring.get(index, id) else {
    return Err(OsalError::InvalidId);
  };

  Ok(TimerInfo {
    name: record.name().to_owned(),
    creator: record.creator(),
    timebase: record.timebase(),
    start_time: node.schedule.start_time,
    interval_time: node.schedule.interval_time,
    wait_time: u32::try_from(node.schedule.wait_time.max(0)).unwrap_or(u32::MAX),
    backlog_resets: node.schedule.backlog_resets,
    accuracy: shared.accuracy(),
    flags: record.flags(),
  })
}

/// Wraps a user closure into the shared callback type.
#[inline]
pub(crate) fn callback<F>(function: F) -> TimerCallback
where
  F: Fn(ObjectId) + Send + Sync + 'static,
{
  StdArc::new(function)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
