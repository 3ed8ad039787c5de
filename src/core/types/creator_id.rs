use std::cell::Cell;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use std::num::NonZeroU32;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use crate::core::fatal;

thread_local! {
  static CURRENT: Cell<Option<CreatorId>> = const { Cell::new(None) };
}

/// Identity of the thread that created an object.
///
/// Every thread that calls into the registry is lazily assigned a
/// process-unique creator ID the first time it is asked for one.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CreatorId {
  inner: NonZeroU32,
}

impl CreatorId {
  /// Returns the creator identity of the calling thread.
  ///
  /// Threads torn down past their thread-local storage report as
  /// [`CreatorId::ORPHAN`].
  #[inline]
  pub fn current() -> Self {
    CURRENT
      .try_with(|thread| {
        thread.get().unwrap_or_else(
          #[cold]
          || {
            let id: CreatorId = next_creator_id();
            thread.set(Some(id));
            id
          },
        )
      })
      .unwrap_or(Self::ORPHAN)
  }

  /// Creator reported for threads without usable thread-local storage.
  pub const ORPHAN: Self = Self {
    inner: NonZeroU32::MAX,
  };

  /// Returns this `CreatorId` as a numeric identifier.
  #[inline]
  pub const fn as_u32(&self) -> NonZeroU32 {
    self.inner
  }
}

impl Debug for CreatorId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for CreatorId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#CREATOR<{}>", self.inner)
  }
}

fn next_creator_id() -> CreatorId {
  static ID: AtomicU32 = AtomicU32::new(0);

  let mut last: u32 = ID.load(Ordering::Relaxed);

  'next: loop {
    let Some(id) = last.checked_add(1) else {
      exhausted();
    };

    if id == u32::MAX {
      exhausted();
    }

    match ID.compare_exchange_weak(last, id, Ordering::Relaxed, Ordering::Relaxed) {
      Ok(_) => {
        let Some(inner) = NonZeroU32::new(id) else {
          exhausted();
        };

        break 'next CreatorId { inner };
      }
      Err(next) => last = next,
    }
  }
}

#[cold]
fn exhausted() -> ! {
  fatal!("failed to generate unique creator ID: bitspace exhausted")
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::thread;

  use crate::core::CreatorId;

  #[test]
  fn test_stable_per_thread() {
    assert_eq!(CreatorId::current(), CreatorId::current());
  }

  #[test]
  fn test_unique_across_threads() {
    let this: CreatorId = CreatorId::current();
    let that: CreatorId = thread::spawn(CreatorId::current).join().unwrap();

    assert_ne!(this, that);
    assert_ne!(that, CreatorId::ORPHAN);
  }
}
