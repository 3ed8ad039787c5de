//! One-shot handoff of a value between two threads.
//!
//! The receiving side waits with an optional deadline. If it gives up, the
//! latch is abandoned and a late [`Latch::set`] hands the value back to the
//! sender so it can be disposed of there.

use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::time::Duration;
use std::time::Instant;

enum State<T> {
  Empty,
  Ready(T),
  Taken,
  Abandoned,
}

pub(crate) struct Latch<T> {
  state: Mutex<State<T>>,
  ready: Condvar,
}

impl<T> Latch<T> {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self {
      state: Mutex::new(State::Empty),
      ready: Condvar::new(),
    }
  }

  /// Publishes `value` to the waiter.
  ///
  /// Returns the value back if the waiter already gave up, or if a value was
  /// published before.
  pub(crate) fn set(&self, value: T) -> Result<(), T> {
    let mut state: MutexGuard<'_, State<T>> = self.state.lock();

    if !matches!(*state, State::Empty) {
      return Err(value);
    }

    *state = State::Ready(value);
    self.ready.notify_all();

    Ok(())
  }

  /// Waits for the value, at most `timeout` if given.
  ///
  /// Returns `None` if the wait expired, after which the latch is abandoned.
  pub(crate) fn wait(&self, timeout: Option<Duration>) -> Option<T> {
    let deadline: Option<Instant> = timeout.map(|timeout| Instant::now() + timeout);
    let mut state: MutexGuard<'_, State<T>> = self.state.lock();

    loop {
      match std::mem::replace(&mut *state, State::Taken) {
        State::Ready(value) => return Some(value),
        State::Taken => return None,
        State::Abandoned => {
          *state = State::Abandoned;
          return None;
        }
        State::Empty => {
          *state = State::Empty;
        }
      }

      match deadline {
        Some(deadline) => {
          if self.ready.wait_until(&mut state, deadline).timed_out()
            && matches!(*state, State::Empty)
          {
            *state = State::Abandoned;
            return None;
          }
        }
        None => self.ready.wait(&mut state),
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
