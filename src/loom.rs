#[cfg(not(loom))]
pub(crate) mod export {
  pub(crate) mod sync {
    pub(crate) use super::super::event::Event;
    pub(crate) use parking_lot::RwLock;
    pub(crate) use parking_lot::RwLockReadGuard;
    pub(crate) use parking_lot::RwLockWriteGuard;
  }
}

#[cfg(loom)]
pub(crate) mod export {
  pub(crate) mod sync {
    pub(crate) use super::super::event::Event;
    pub(crate) use super::super::rwlock::RwLock;
    pub(crate) use loom::sync::RwLockReadGuard;
    pub(crate) use loom::sync::RwLockWriteGuard;
  }
}

/// Wakeup point for threads waiting on state kept under another lock.
///
/// Waiters evaluate their condition while holding the event lock and
/// notifiers take the same lock before waking, so a change made before
/// [`Event::notify_all`] is never missed.
#[cfg(not(loom))]
mod event {
  use parking_lot::Condvar;
  use parking_lot::Mutex;
  use parking_lot::MutexGuard;

  #[derive(Debug)]
  pub(crate) struct Event {
    lock: Mutex<()>,
    cvar: Condvar,
  }

  impl Event {
    #[inline]
    pub(crate) fn new() -> Self {
      Self {
        lock: Mutex::new(()),
        cvar: Condvar::new(),
      }
    }

    /// Blocks while `blocked` returns `true`.
    pub(crate) fn wait_while<F>(&self, mut blocked: F)
    where
      F: FnMut() -> bool,
    {
      let mut guard: MutexGuard<'_, ()> = self.lock.lock();

      while blocked() {
        self.cvar.wait(&mut guard);
      }
    }

    pub(crate) fn notify_all(&self) {
      let _guard: MutexGuard<'_, ()> = self.lock.lock();
      self.cvar.notify_all();
    }
  }
}

#[cfg(loom)]
mod event {
  use loom::sync::Condvar;
  use loom::sync::Mutex;
  use loom::sync::MutexGuard;
  use std::sync::PoisonError;

  #[derive(Debug)]
  pub(crate) struct Event {
    lock: Mutex<()>,
    cvar: Condvar,
  }

  impl Event {
    #[inline]
    pub(crate) fn new() -> Self {
      Self {
        lock: Mutex::new(()),
        cvar: Condvar::new(),
      }
    }

    pub(crate) fn wait_while<F>(&self, mut blocked: F)
    where
      F: FnMut() -> bool,
    {
      let mut guard: MutexGuard<'_, ()> = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

      while blocked() {
        guard = self.cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
      }
    }

    pub(crate) fn notify_all(&self) {
      let _guard: MutexGuard<'_, ()> = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
      self.cvar.notify_all();
    }
  }
}

/// `parking_lot`-shaped wrapper over the loom lock so table code is written
/// once against the non-poisoning API.
#[cfg(loom)]
mod rwlock {
  use loom::sync::RwLockReadGuard;
  use loom::sync::RwLockWriteGuard;
  use std::sync::PoisonError;

  pub(crate) struct RwLock<T> {
    inner: loom::sync::RwLock<T>,
  }

  impl<T> RwLock<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
      Self {
        inner: loom::sync::RwLock::new(value),
      }
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
      self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
      self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
  }
}

#[doc(inline)]
pub(crate) use self::export::*;
