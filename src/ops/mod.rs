//! Built-in operations.
//!
//! Each function here implements one public operation against a [`System`];
//! the [`Osal`] facade is a thin wrapper that forwards to them.
//!
//! [`Osal`]: crate::api::Osal

mod object;
mod timebase;
mod timer;

pub(crate) use self::object::*;
pub(crate) use self::timebase::*;
pub(crate) use self::timer::*;

use std::sync::Arc;

use crate::api::OsalConfig;
use crate::core::ObjectKind;
use crate::core::ObjectTable;
use crate::core::TimeBase;
use crate::core::TimerCb;
use crate::error::OsalError;
use crate::platform::Platform;
use crate::sched;

/// Every object table plus the platform they are bound to.
pub(crate) struct System {
  pub(crate) config: OsalConfig,
  pub(crate) platform: Arc<dyn Platform>,
  pub(crate) timebases: ObjectTable<TimeBase>,
  pub(crate) timers: ObjectTable<TimerCb>,
}

impl System {
  pub(crate) fn new(config: OsalConfig, platform: Arc<dyn Platform>) -> Self {
    let timebases: ObjectTable<TimeBase> =
      ObjectTable::new(ObjectKind::TimeBase, config.max_timebases, config.max_name_len);

    let timers: ObjectTable<TimerCb> =
      ObjectTable::new(ObjectKind::TimerCb, config.max_timers, config.max_name_len);

    Self {
      config,
      platform,
      timebases,
      timers,
    }
  }
}

impl Drop for System {
  fn drop(&mut self) {
    if let Err(error) = delete_all_objects(self) {
      tracing::warn!(target: "osal", %error, "objects leaked at shutdown");
    }
  }
}

/// Rejects operations that must not run on a service loop thread.
#[inline]
fn forbid_service_context() -> Result<(), OsalError> {
  match sched::current_timebase() {
    Some(_) => Err(OsalError::IncorrectObjState),
    None => Ok(()),
  }
}

/// Rejects start and interval times outside the accepted range.
#[inline]
fn check_times(start: u32, interval: u32) -> Result<(), OsalError> {
  if start >= crate::consts::MAX_TIME_VALUE || interval >= crate::consts::MAX_TIME_VALUE {
    return Err(OsalError::InvalidArgument);
  }

  Ok(())
}
