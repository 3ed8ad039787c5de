//! Public entry point.
//!
//! An [`Osal`] owns one timebase table and one timer table bound to a
//! [`Platform`]. Handles are cheap to clone; the objects are deleted when the
//! last handle is dropped. Handles captured by timer callbacks count too, see
//! [`Osal::timer_add`].

mod config;
mod info;

pub use self::config::OsalConfig;
pub use self::info::ObjectInfo;
pub use self::info::TimeBaseInfo;
pub use self::info::TimerInfo;

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;

use crate::core::CreatorId;
use crate::core::ObjectId;
use crate::core::ObjectKind;
use crate::error::OsalError;
use crate::init;
use crate::ops;
use crate::ops::System;
use crate::platform::Platform;
use crate::platform::SyncMode;

// -----------------------------------------------------------------------------
// OSAL
// -----------------------------------------------------------------------------

/// Handle to an object registry and its timebase scheduler.
#[derive(Clone)]
pub struct Osal {
  inner: Arc<System>,
}

impl Osal {
  /// Creates a new instance bound to `platform`.
  ///
  /// Table sizes are clamped to the supported range.
  pub fn new<P>(config: OsalConfig, platform: Arc<P>) -> Self
  where
    P: Platform,
  {
    if config.tracing_install {
      if let Err(error) = init::init_tracing(&config) {
        eprintln!("failed to set tracing subscriber:");
        eprintln!("    {error}");
      }
    }

    tracing::debug!(
      target: "osal",
      platform = platform.name(),
      timebases = config.max_timebases,
      timers = config.max_timers,
      "initializing",
    );

    Self {
      inner: Arc::new(System::new(config, platform)),
    }
  }

  /// Returns the configuration this instance was created with.
  #[inline]
  pub fn config(&self) -> &OsalConfig {
    &self.inner.config
  }

  // ---------------------------------------------------------------------------
  // Timebase API
  // ---------------------------------------------------------------------------

  /// Creates a timebase and starts its service loop.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidArgument`], [`OsalError::NameTooLong`] or
  ///   [`OsalError::NameTaken`] for a bad name
  /// - [`OsalError::NoFreeSlots`] if the timebase table is full
  /// - [`OsalError::IncorrectObjState`] if called from a timer callback
  /// - [`OsalError::Timeout`] if the service loop did not attach in time
  /// - any error from the platform while acquiring the tick source
  #[inline]
  pub fn timebase_create(&self, name: &str, sync: SyncMode) -> Result<ObjectId, OsalError> {
    ops::timebase_create(&self.inner, name, sync)
  }

  /// Sets the tick cadence of a free-running timebase, in microseconds.
  ///
  /// `(0, 0)` stops the tick source.
  ///
  /// # Errors
  ///
  /// - [`OsalError::IncorrectObjState`] for externally synchronized
  ///   timebases, or if called from a timer callback
  /// - [`OsalError::InvalidArgument`] for times out of range
  /// - [`OsalError::InvalidId`] if `id` is not a live timebase
  #[inline]
  pub fn timebase_set(&self, id: ObjectId, start: u32, interval: u32) -> Result<(), OsalError> {
    ops::timebase_set(&self.inner, id, start, interval)
  }

  /// Stops the service loop of a timebase and deletes it.
  ///
  /// # Errors
  ///
  /// - [`OsalError::ResourceBusy`] while timers are attached
  /// - [`OsalError::IncorrectObjState`] if called from a timer callback
  /// - [`OsalError::InvalidId`] if `id` is not a live timebase
  #[inline]
  pub fn timebase_delete(&self, id: ObjectId) -> Result<(), OsalError> {
    ops::timebase_delete(&self.inner, id)
  }

  #[inline]
  pub fn timebase_get_id_by_name(&self, name: &str) -> Result<ObjectId, OsalError> {
    ops::timebase_get_id_by_name(&self.inner, name)
  }

  #[inline]
  pub fn timebase_get_info(&self, id: ObjectId) -> Result<TimeBaseInfo, OsalError> {
    ops::timebase_get_info(&self.inner, id)
  }

  /// Returns the free-run counter of a timebase, in microseconds.
  #[inline]
  pub fn timebase_get_free_run(&self, id: ObjectId) -> Result<u64, OsalError> {
    ops::timebase_get_free_run(&self.inner, id)
  }

  // ---------------------------------------------------------------------------
  // Timer API
  // ---------------------------------------------------------------------------

  /// Attaches an idle timer to `timebase`. It fires only once armed with
  /// [`timer_set`](Self::timer_set).
  ///
  /// The callback runs on the service loop thread of the timebase and
  /// receives the timer ID. It may add, arm or delete timers, but must not
  /// create, program or delete timebases.
  ///
  /// A callback that captures a clone of this handle keeps the instance alive
  /// until the timer is deleted, so dropping the other handles alone does not
  /// delete the remaining objects. Call
  /// [`delete_all_objects`](Self::delete_all_objects) or delete such timers
  /// explicitly.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidArgument`], [`OsalError::NameTooLong`] or
  ///   [`OsalError::NameTaken`] for a bad name
  /// - [`OsalError::NoFreeSlots`] if the timer table is full
  /// - [`OsalError::InvalidId`] if `timebase` is not a live timebase
  #[inline]
  pub fn timer_add<F>(
    &self,
    name: &str,
    timebase: ObjectId,
    callback: F,
  ) -> Result<ObjectId, OsalError>
  where
    F: Fn(ObjectId) + Send + Sync + 'static,
  {
    ops::timer_add(&self.inner, name, timebase, ops::callback(callback))
  }

  /// Creates a timer with its own free-running timebase of the same name.
  ///
  /// Returns the timer ID and the tick accuracy in microseconds. Arming the
  /// timer also programs the timebase; deleting it deletes the timebase.
  #[inline]
  pub fn timer_create<F>(&self, name: &str, callback: F) -> Result<(ObjectId, u32), OsalError>
  where
    F: Fn(ObjectId) + Send + Sync + 'static,
  {
    ops::timer_create(&self.inner, name, ops::callback(callback))
  }

  /// Arms a timer, in microseconds. A zero `start` waits one `interval`; a
  /// zero `interval` fires once.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidArgument`] if both are zero or either is out of
  ///   range
  /// - [`OsalError::InvalidId`] if `id` is not a live timer
  #[inline]
  pub fn timer_set(&self, id: ObjectId, start: u32, interval: u32) -> Result<(), OsalError> {
    ops::timer_set(&self.inner, id, start, interval)
  }

  /// Detaches and deletes a timer.
  ///
  /// When this returns the callback is not running and will not run again,
  /// except when called from that callback itself.
  #[inline]
  pub fn timer_delete(&self, id: ObjectId) -> Result<(), OsalError> {
    ops::timer_delete(&self.inner, id)
  }

  #[inline]
  pub fn timer_get_id_by_name(&self, name: &str) -> Result<ObjectId, OsalError> {
    ops::timer_get_id_by_name(&self.inner, name)
  }

  #[inline]
  pub fn timer_get_info(&self, id: ObjectId) -> Result<TimerInfo, OsalError> {
    ops::timer_get_info(&self.inner, id)
  }

  // ---------------------------------------------------------------------------
  // Object API
  //
  // These services cover the timebases and timers owned by this instance;
  // IDs of any other kind are rejected with `InvalidId`. Other resource kinds
  // keep their own `ObjectTable`, which provides the same create, delete,
  // lookup and iteration services for any kind.
  // ---------------------------------------------------------------------------

  /// Returns the kind encoded in `id`.
  #[inline]
  pub fn identify_object(&self, id: ObjectId) -> Result<ObjectKind, OsalError> {
    ops::identify_object(id)
  }

  /// Converts `id` into a zero-based index below the capacity of its table.
  ///
  /// Only timebase and timer IDs are accepted; other kinds are indexed by
  /// their own [`ObjectTable::index_of`](crate::core::ObjectTable::index_of).
  #[inline]
  pub fn object_index(&self, id: ObjectId) -> Result<usize, OsalError> {
    ops::object_index(&self.inner, id)
  }

  /// Returns the properties common to every kind for a timebase or timer.
  ///
  /// # Errors
  ///
  /// Returns [`OsalError::InvalidId`] if `id` is not a live timebase or
  /// timer. Objects of other kinds live in their own
  /// [`ObjectTable`](crate::core::ObjectTable).
  #[inline]
  pub fn object_info(&self, id: ObjectId) -> Result<ObjectInfo, OsalError> {
    ops::object_info(&self.inner, id)
  }

  #[inline]
  pub fn object_name(&self, id: ObjectId) -> Result<String, OsalError> {
    ops::object_info(&self.inner, id).map(|info| info.name)
  }

  /// Calls `visitor` with every live object, optionally only those created by
  /// `creator`. The visitor may delete the object it is given.
  #[inline]
  pub fn for_each_object<F>(&self, creator: Option<CreatorId>, visitor: F)
  where
    F: FnMut(ObjectId),
  {
    ops::for_each_object(&self.inner, creator, visitor)
  }

  /// Deletes every timer, then every timebase.
  ///
  /// # Errors
  ///
  /// Returns [`OsalError::ResourceBusy`] if some objects could not be deleted.
  #[inline]
  pub fn delete_all_objects(&self) -> Result<(), OsalError> {
    ops::delete_all_objects(&self.inner)
  }
}

impl Debug for Osal {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Osal")
      .field("platform", &self.inner.platform.name())
      .field("timebases", &self.inner.timebases)
      .field("timers", &self.inner.timers)
      .finish()
  }
}
