use tracing::debug;
use tracing::info;
use triomphe::Arc;

use crate::api::ObjectInfo;
use crate::consts::DELETE_ALL_PASSES;
use crate::core::CreatorId;
use crate::core::ObjectId;
use crate::core::ObjectKind;
use crate::core::ObjectRecord;
use crate::core::ObjectTable;
use crate::error::OsalError;
use crate::ops::System;
use crate::ops::timebase_delete;
use crate::ops::timer_delete;

/// Returns the kind of object `id` refers to, live or not.
#[inline]
pub(crate) fn identify_object(id: ObjectId) -> Result<ObjectKind, OsalError> {
  id.kind().ok_or(OsalError::InvalidId)
}

/// Converts `id` into the zero-based slot index within its table.
pub(crate) fn object_index(system: &System, id: ObjectId) -> Result<usize, OsalError> {
  match identify_object(id)? {
    ObjectKind::TimeBase => system.timebases.index_of(id),
    ObjectKind::TimerCb => system.timers.index_of(id),
    _ => Err(OsalError::InvalidId),
  }
}

/// Returns the properties shared by objects of every kind.
pub(crate) fn object_info(system: &System, id: ObjectId) -> Result<ObjectInfo, OsalError> {
  match identify_object(id)? {
    ObjectKind::TimeBase => info(&system.timebases, id),
    ObjectKind::TimerCb => info(&system.timers, id),
    _ => Err(OsalError::InvalidId),
  }
}

fn info<T>(table: &ObjectTable<T>, id: ObjectId) -> Result<ObjectInfo, OsalError> {
  let record: Arc<ObjectRecord<T>> = table.get(id)?;

  Ok(ObjectInfo {
    id,
    kind: table.kind(),
    name: record.name().to_owned(),
    creator: record.creator(),
  })
}

/// Visits every live object of every kind, optionally only those created by
/// `creator`.
///
/// The visitor runs with no lock held and may delete the object it is given.
pub(crate) fn for_each_object<F>(system: &System, creator: Option<CreatorId>, mut visitor: F)
where
  F: FnMut(ObjectId),
{
  system.timebases.for_each(creator, &mut visitor);
  system.timers.for_each(creator, &mut visitor);
}

/// Deletes every timer and then every timebase.
///
/// Deletion is retried for a bounded number of passes so that objects created
/// concurrently, or busy on the first attempt, are still collected.
///
/// # Errors
///
/// Returns [`OsalError::ResourceBusy`] if objects remain after the final pass.
pub(crate) fn delete_all_objects(system: &System) -> Result<(), OsalError> {
  for pass in 1..=DELETE_ALL_PASSES {
    let mut found: usize = 0;

    system.timers.for_each(None, |id| {
      found += 1;

      if let Err(error) = timer_delete(system, id) {
        debug!(target: "osal", %id, %error, pass, "timer not deleted");
      }
    });

    system.timebases.for_each(None, |id| {
      found += 1;

      if let Err(error) = timebase_delete(system, id) {
        debug!(target: "osal", %id, %error, pass, "timebase not deleted");
      }
    });

    if found == 0 {
      return Ok(());
    }

    info!(target: "osal", pass, objects = found, "delete-all pass finished");

    if system.timers.is_empty() && system.timebases.is_empty() {
      return Ok(());
    }
  }

  Err(OsalError::ResourceBusy)
}
