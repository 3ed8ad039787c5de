//! Basic execution timing utilities.

use std::time::Duration;
use std::time::Instant;

#[inline(always)]
pub(crate) fn measure_fn<F, R>(f: F) -> (R, Duration)
where
  F: FnOnce() -> R,
{
  let instant: Instant = Instant::now();
  let output: R = f();

  (output, instant.elapsed())
}

/// Converts a duration to whole microseconds, saturating at `u32::MAX`.
#[inline]
pub(crate) fn duration_micros(duration: Duration) -> u32 {
  u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::utils::duration_micros;
  use crate::utils::measure_fn;

  #[test]
  fn test_duration_micros() {
    assert_eq!(duration_micros(Duration::ZERO), 0);
    assert_eq!(duration_micros(Duration::from_millis(3)), 3_000);
    assert_eq!(duration_micros(Duration::from_secs(u64::MAX)), u32::MAX);
  }

  #[test]
  fn test_measure_fn_returns_output() {
    let (value, elapsed): (u32, Duration) = measure_fn(|| 7);

    assert_eq!(value, 7);
    assert!(elapsed < Duration::from_secs(60));
  }
}
