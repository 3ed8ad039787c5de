use std::time::Duration;

// -----------------------------------------------------------------------------
// Object Names
// -----------------------------------------------------------------------------

/// Maximum number of characters in an object name.
pub const MAX_API_NAME: usize = 20;

// -----------------------------------------------------------------------------
// Object Tables
// -----------------------------------------------------------------------------

/// Minimum number of slots in any object table.
pub const MIN_TABLE_ENTRIES: usize = 1;

/// Maximum number of slots in any object table.
///
/// Bounded by the serial field of an [`ObjectId`] so that every slot can
/// cycle through several generations before its serial wraps.
///
/// [`ObjectId`]: crate::core::ObjectId
pub const MAX_TABLE_ENTRIES: usize = 1 << 16;

/// Default number of timebase slots.
pub const DEF_MAX_TIMEBASES: usize = 8;

/// Default number of timer callback slots.
pub const DEF_MAX_TIMERS: usize = 16;

// -----------------------------------------------------------------------------
// Timebase Behavior
// -----------------------------------------------------------------------------

/// Upper bound (exclusive) for start and interval times, in microseconds.
pub const MAX_TIME_VALUE: u32 = 1_000_000_000;

/// How long `timebase_create` waits for the service loop to attach to its
/// tick source.
pub const DEF_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Tick granularity reported by the host clock adapter, in microseconds.
pub const HOST_CLOCK_ACCURACY: u32 = 1_000;

// -----------------------------------------------------------------------------
// Shutdown
// -----------------------------------------------------------------------------

/// Number of sweeps `delete_all_objects` makes before giving up.
pub const DELETE_ALL_PASSES: usize = 5;
