use parking_lot::MutexGuard;
use tracing::debug;
use triomphe::Arc;

use crate::api::TimeBaseInfo;
use crate::core::ObjectId;
use crate::core::ObjectRecord;
use crate::core::TimeBase;
use crate::core::TimeBaseShared;
use crate::core::TimeBaseState;
use crate::error::OsalError;
use crate::ops::System;
use crate::ops::check_times;
use crate::ops::forbid_service_context;
use crate::platform::SyncMode;
use crate::platform::TickSource;
use crate::sched::ServiceHandle;

/// Creates a timebase and starts its service loop.
///
/// Returns only after the loop has attached to its tick source.
pub(crate) fn timebase_create(
  system: &System,
  name: &str,
  sync: SyncMode,
) -> Result<ObjectId, OsalError> {
  forbid_service_context()?;

  let id: ObjectId = system.timebases.create(name, |id| {
    let shared: Arc<TimeBaseShared> = Arc::new(TimeBaseShared::new(id, system.timers.capacity()));

    let (service, source): (ServiceHandle, Box<dyn TickSource>) = ServiceHandle::start(
      &shared,
      name,
      &sync,
      &system.platform,
      system.config.start_timeout,
    )?;

    Ok(TimeBase::new(sync, shared, source, service))
  })?;

  debug!(target: "osal", %id, name, "timebase created");

  Ok(id)
}

/// Reprograms the tick cadence of a free-running timebase.
pub(crate) fn timebase_set(
  system: &System,
  id: ObjectId,
  start: u32,
  interval: u32,
) -> Result<(), OsalError> {
  forbid_service_context()?;
  check_times(start, interval)?;

  let record: Arc<ObjectRecord<TimeBase>> = system.timebases.get(id)?;

  if record.sync().is_external() {
    return Err(OsalError::IncorrectObjState);
  }

  record.program(start, interval)?;

  debug!(target: "osal", %id, start, interval, "timebase programmed");

  Ok(())
}

/// Stops the service loop of a timebase and deletes it.
///
/// Fails with [`OsalError::ResourceBusy`] while timers are attached.
pub(crate) fn timebase_delete(system: &System, id: ObjectId) -> Result<(), OsalError> {
  forbid_service_context()?;

  system.timebases.delete(id, |record| {
    {
      let mut state: MutexGuard<'_, TimeBaseState> = record.shared().lock();

      if !state.ring.is_empty() {
        return Err(OsalError::ResourceBusy);
      }

      state.closed = true;
    }

    record.shutdown();

    Ok(())
  })?;

  debug!(target: "osal", %id, "timebase deleted");

  Ok(())
}

pub(crate) fn timebase_get_id_by_name(system: &System, name: &str) -> Result<ObjectId, OsalError> {
  system.timebases.lookup_by_name(name)
}

pub(crate) fn timebase_get_info(system: &System, id: ObjectId) -> Result<TimeBaseInfo, OsalError> {
  let record: Arc<ObjectRecord<TimeBase>> = system.timebases.get(id)?;
  let shared: &Arc<TimeBaseShared> = record.shared();
  let state: MutexGuard<'_, TimeBaseState> = shared.lock();

  Ok(TimeBaseInfo {
    name: record.name().to_owned(),
    creator: record.creator(),
    sync: record.sync().clone(),
    accuracy: shared.accuracy(),
    freerun_time: state.freerun_time,
    ticks: state.ticks,
    nominal_start_time: state.nominal_start_time,
    nominal_interval_time: state.nominal_interval_time,
    timers: state.ring.len(),
    faulted: shared.is_faulted(),
  })
}

pub(crate) fn timebase_get_free_run(system: &System, id: ObjectId) -> Result<u64, OsalError> {
  let record: Arc<ObjectRecord<TimeBase>> = system.timebases.get(id)?;
  let freerun: u64 = record.shared().lock().freerun_time;

  Ok(freerun)
}
