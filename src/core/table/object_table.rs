//! Fixed-capacity object table shared by every resource kind.
//!
//! This module provides [`ObjectTable`], the slot arena behind every OSAL
//! resource kind. A table hands out [`ObjectId`]s that encode the kind, the
//! slot index and a reuse serial, and guarantees that a stale ID never
//! resolves to a newer object occupying the same slot.
//!
//! # Slot States
//!
//! Each slot is in one of four states:
//!
//! - `Free`: Available for allocation
//! - `Reserved`: Claimed by a create whose initializer is still running
//! - `Active`: Holds a published record
//! - `Closing`: Holds a record whose teardown is running
//!
//! Reserved slots are invisible to lookups but keep their name claimed, so a
//! concurrent create with the same name fails with [`NameTaken`]. Closing
//! slots stay visible until their teardown succeeds.
//!
//! # Concurrency Model
//!
//! - **Create**: Claims a slot under the write lock, initializes outside it,
//!   then publishes under the write lock again
//! - **Delete**: Marks the slot closing under the write lock, tears down
//!   outside it, then frees the slot and advances its serial
//! - **Lookup**: Shared read lock only
//! - **Iteration**: Lock-per-entry; the visitor runs without any lock held
//!
//! Initializers and teardowns never run under the table lock, so slow or
//! blocking kind-specific work cannot stall unrelated creates or lookups.
//!
//! [`NameTaken`]: OsalError::NameTaken

use crossbeam_utils::CachePadded;
use hashbrown::HashMap;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Deref;
use triomphe::Arc;

use crate::consts::MAX_TABLE_ENTRIES;
use crate::consts::MIN_TABLE_ENTRIES;
use crate::core::CreatorId;
use crate::core::ObjectId;
use crate::core::ObjectKind;
use crate::error::OsalError;
use crate::loom::sync::Event;
use crate::loom::sync::RwLock;
use crate::loom::sync::RwLockReadGuard;
use crate::loom::sync::RwLockWriteGuard;

// -----------------------------------------------------------------------------
// Object Record
// -----------------------------------------------------------------------------

/// A published object: the fields common to every kind plus its payload.
pub struct ObjectRecord<T> {
  id: ObjectId,
  name: Box<str>,
  creator: CreatorId,
  data: T,
}

impl<T> ObjectRecord<T> {
  /// Returns the ID this record was published under.
  #[inline]
  pub const fn id(&self) -> ObjectId {
    self.id
  }

  /// Returns the name of the object.
  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the identity of the thread that created the object.
  #[inline]
  pub const fn creator(&self) -> CreatorId {
    self.creator
  }

  /// Returns the kind-specific payload.
  #[inline]
  pub const fn data(&self) -> &T {
    &self.data
  }
}

impl<T> Deref for ObjectRecord<T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.data
  }
}

impl<T> Debug for ObjectRecord<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ObjectRecord")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("creator", &self.creator)
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Object Table
// -----------------------------------------------------------------------------

/// Fixed-capacity table of objects of a single [`ObjectKind`].
///
/// # Capacity
///
/// Table capacity is fixed at creation time and clamped between
/// [`MIN_TABLE_ENTRIES`] and [`MAX_TABLE_ENTRIES`].
///
/// # Slot Reuse
///
/// Free slots are searched round-robin starting after the most recently
/// allocated one, which delays reuse of a just-freed slot. When a slot is
/// reused its serial advances by the table capacity.
///
/// # Examples
///
/// ```
/// use osal::core::ObjectKind;
/// use osal::core::ObjectTable;
/// use osal::error::OsalError;
///
/// let table: ObjectTable<u32> = ObjectTable::new(ObjectKind::Queue, 4, 16);
///
/// let id = table.create("q0", |_| Ok(7)).unwrap();
///
/// assert_eq!(table.lookup_by_name("q0"), Ok(id));
/// assert_eq!(**table.get(id).unwrap(), 7);
/// assert_eq!(table.create("q0", |_| Ok(8)), Err(OsalError::NameTaken));
///
/// table.delete(id, |_| Ok(())).unwrap();
///
/// assert_eq!(table.get(id).unwrap_err(), OsalError::InvalidId);
/// ```
pub struct ObjectTable<T> {
  kind: ObjectKind,
  capacity: usize,
  name_len: usize,
  inner: CachePadded<RwLock<Table<T>>>,
  released: Event,
}

impl<T> ObjectTable<T> {
  /// Creates a new, empty table holding up to `capacity` objects of `kind`
  /// with names of at most `name_len` characters.
  pub fn new(kind: ObjectKind, capacity: usize, name_len: usize) -> Self {
    let capacity: usize = capacity.clamp(MIN_TABLE_ENTRIES, MAX_TABLE_ENTRIES);

    Self {
      kind,
      capacity,
      name_len,
      inner: CachePadded::new(RwLock::new(Table::new(capacity))),
      released: Event::new(),
    }
  }

  /// Returns the kind of object stored in this table.
  #[inline]
  pub const fn kind(&self) -> ObjectKind {
    self.kind
  }

  /// Returns the maximum number of objects the table can hold.
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the number of claimed slots, including those still being
  /// initialized.
  #[inline]
  pub fn len(&self) -> usize {
    self.read().len
  }

  /// Returns `true` if no slot is claimed.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Creates a new object named `name`.
  ///
  /// A slot is claimed under the table lock, then `init` runs without the
  /// lock held and receives the ID the object will be published under. The ID
  /// is published only if `init` succeeds.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidArgument`] if `name` is empty
  /// - [`OsalError::NameTooLong`] if `name` exceeds the table's name length
  /// - [`OsalError::NameTaken`] if another object of this kind uses `name`
  /// - [`OsalError::NoFreeSlots`] if the table is full
  /// - any error returned by `init`; the slot and name are released
  pub fn create<F>(&self, name: &str, init: F) -> Result<ObjectId, OsalError>
  where
    F: FnOnce(ObjectId) -> Result<T, OsalError>,
  {
    self.check_name(name)?;

    let permit: Permit<'_, T> = self.reserve(name)?;

    match init(permit.id) {
      Ok(data) => Ok(permit.commit(data)),
      Err(error) => {
        tracing::debug!(target: "osal", kind = %self.kind, id = %permit.id, %error, "object init failed");
        Err(error)
      }
    }
  }

  /// Deletes the object identified by `id`.
  ///
  /// The slot is marked closing, then `teardown` runs without the table lock
  /// held. If `teardown` fails the object is restored untouched; otherwise the
  /// slot is freed and its serial advanced so `id` never resolves again.
  ///
  /// A concurrent delete of the same object blocks until the first one
  /// finishes, then fails with [`OsalError::InvalidId`] if it succeeded.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidId`] if `id` does not name a live object of this
  ///   kind
  /// - any error returned by `teardown`
  pub fn delete<F>(&self, id: ObjectId, teardown: F) -> Result<(), OsalError>
  where
    F: FnOnce(&ObjectRecord<T>) -> Result<(), OsalError>,
  {
    self.delete_with(id, true, teardown)
  }

  /// Deletes the object identified by `id` unless another delete of it is
  /// already in progress.
  ///
  /// Unlike [`delete`](Self::delete) this never waits on a concurrent
  /// teardown, so it is safe to call from code that teardown itself waits
  /// for.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidId`] if `id` does not name a live object of this
  ///   kind, or the object is already being deleted
  /// - any error returned by `teardown`
  pub fn try_delete<F>(&self, id: ObjectId, teardown: F) -> Result<(), OsalError>
  where
    F: FnOnce(&ObjectRecord<T>) -> Result<(), OsalError>,
  {
    self.delete_with(id, false, teardown)
  }

  fn delete_with<F>(&self, id: ObjectId, wait: bool, teardown: F) -> Result<(), OsalError>
  where
    F: FnOnce(&ObjectRecord<T>) -> Result<(), OsalError>,
  {
    let index: usize = self.index_of(id)?;
    let closing: Closing<'_, T> = self.close(index, id, wait)?;

    match teardown(&closing.record) {
      Ok(()) => {
        closing.release();
        Ok(())
      }
      Err(error) => {
        tracing::debug!(target: "osal", kind = %self.kind, %id, %error, "object teardown failed");
        Err(error)
      }
    }
  }

  /// Returns the record of the live object identified by `id`.
  ///
  /// # Errors
  ///
  /// Returns [`OsalError::InvalidId`] if `id` is stale, out of range, or names
  /// an object of another kind.
  pub fn get(&self, id: ObjectId) -> Result<Arc<ObjectRecord<T>>, OsalError> {
    let index: usize = self.index_of(id)?;
    let guard: RwLockReadGuard<'_, Table<T>> = self.read();
    let slot: &Slot<T> = &guard.slots[index];

    if slot.serial != id.serial() {
      return Err(OsalError::InvalidId);
    }

    match &slot.state {
      SlotState::Active(record) | SlotState::Closing(record) => Ok(Arc::clone(record)),
      SlotState::Free | SlotState::Reserved => Err(OsalError::InvalidId),
    }
  }

  /// Returns `true` if `id` names a live object of this table.
  #[inline]
  pub fn exists(&self, id: ObjectId) -> bool {
    self.get(id).is_ok()
  }

  /// Returns the ID of the live object named `name`.
  ///
  /// # Errors
  ///
  /// - [`OsalError::InvalidArgument`] if `name` is empty
  /// - [`OsalError::NameTooLong`] if `name` exceeds the table's name length
  /// - [`OsalError::NameNotFound`] if no published object uses `name`
  pub fn lookup_by_name(&self, name: &str) -> Result<ObjectId, OsalError> {
    self.check_name(name)?;

    let guard: RwLockReadGuard<'_, Table<T>> = self.read();

    let Some(&index) = guard.names.get(name) else {
      return Err(OsalError::NameNotFound);
    };

    match &guard.slots[index].state {
      SlotState::Active(record) | SlotState::Closing(record) => Ok(record.id),
      SlotState::Free | SlotState::Reserved => Err(OsalError::NameNotFound),
    }
  }

  /// Converts `id` into the index of the slot it occupies.
  ///
  /// This does not check that the object is still live.
  ///
  /// # Errors
  ///
  /// Returns [`OsalError::InvalidId`] if `id` names an object of another kind.
  pub fn index_of(&self, id: ObjectId) -> Result<usize, OsalError> {
    if id.kind() != Some(self.kind) {
      return Err(OsalError::InvalidId);
    }

    Ok(id.serial() as usize % self.capacity())
  }

  /// Calls `visitor` with the ID of every published object, optionally only
  /// those created by `creator`.
  ///
  /// Each slot is inspected under the read lock and the visitor runs with no
  /// lock held, so it may freely create, delete or look up objects. A slot
  /// freed before the iteration reaches it is never visited.
  pub fn for_each<F>(&self, creator: Option<CreatorId>, mut visitor: F)
  where
    F: FnMut(ObjectId),
  {
    for index in 0..self.capacity() {
      let found: Option<ObjectId> = {
        let guard: RwLockReadGuard<'_, Table<T>> = self.read();

        match &guard.slots[index].state {
          SlotState::Active(record) if creator.is_none_or(|id| id == record.creator) => {
            Some(record.id)
          }
          _ => None,
        }
      };

      if let Some(id) = found {
        visitor(id);
      }
    }
  }

  /// Returns a snapshot of the IDs of every published object.
  pub fn ids(&self) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = Vec::new();
    self.for_each(None, |id| ids.push(id));
    ids
  }
}

// -----------------------------------------------------------------------------
// Object Table - Internals
// -----------------------------------------------------------------------------

impl<T> ObjectTable<T> {
  #[inline]
  fn read(&self) -> RwLockReadGuard<'_, Table<T>> {
    self.inner.read()
  }

  #[inline]
  fn write(&self) -> RwLockWriteGuard<'_, Table<T>> {
    self.inner.write()
  }

  fn check_name(&self, name: &str) -> Result<(), OsalError> {
    if name.is_empty() {
      return Err(OsalError::InvalidArgument);
    }

    if name.chars().count() > self.name_len {
      return Err(OsalError::NameTooLong);
    }

    Ok(())
  }

  fn reserve(&self, name: &str) -> Result<Permit<'_, T>, OsalError> {
    let mut guard: RwLockWriteGuard<'_, Table<T>> = self.write();

    if guard.names.contains_key(name) {
      return Err(OsalError::NameTaken);
    }

    let Some(index) = guard.find_free() else {
      return Err(OsalError::NoFreeSlots);
    };

    let serial: u32 = guard.slots[index].serial;

    guard.slots[index].state = SlotState::Reserved;
    guard.names.insert(Box::from(name), index);
    guard.last = index;
    guard.len += 1;

    drop(guard);

    Ok(Permit {
      table: self,
      index,
      id: ObjectId::new(self.kind, serial),
      name: Box::from(name),
      done: false,
    })
  }

  fn is_closing(&self, index: usize, id: ObjectId) -> bool {
    let guard: RwLockReadGuard<'_, Table<T>> = self.read();
    let slot: &Slot<T> = &guard.slots[index];

    slot.serial == id.serial() && matches!(slot.state, SlotState::Closing(_))
  }

  fn close(&self, index: usize, id: ObjectId, wait: bool) -> Result<Closing<'_, T>, OsalError> {
    'claim: loop {
      let mut guard: RwLockWriteGuard<'_, Table<T>> = self.write();
      let slot: &mut Slot<T> = &mut guard.slots[index];

      if slot.serial != id.serial() {
        return Err(OsalError::InvalidId);
      }

      let record: Arc<ObjectRecord<T>> = match &slot.state {
        SlotState::Active(record) => Arc::clone(record),
        SlotState::Closing(_) if wait => {
          // Another thread is tearing this object down; wait for its outcome.
          drop(guard);
          self.released.wait_while(|| self.is_closing(index, id));
          continue 'claim;
        }
        SlotState::Closing(_) | SlotState::Free | SlotState::Reserved => {
          return Err(OsalError::InvalidId);
        }
      };

      slot.state = SlotState::Closing(Arc::clone(&record));

      drop(guard);

      break 'claim Ok(Closing {
        table: self,
        index,
        record,
        done: false,
      });
    }
  }
}

impl<T> Debug for ObjectTable<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let guard: RwLockReadGuard<'_, Table<T>> = self.read();

    f.debug_struct("ObjectTable")
      .field("kind", &self.kind)
      .field("len", &guard.len)
      .field("cap", &guard.slots.len())
      .field("last", &guard.last)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Object Table - Table
// -----------------------------------------------------------------------------

/// Internal table structure protected by the [`ObjectTable`]'s lock.
struct Table<T> {
  /// Slot arena.
  slots: Box<[Slot<T>]>,
  /// Maps claimed names to their slot index.
  names: HashMap<Box<str>, usize>,
  /// Index of the most recently claimed slot.
  last: usize,
  /// Number of claimed slots.
  len: usize,
}

impl<T> Table<T> {
  fn new(capacity: usize) -> Self {
    let slots: Box<[Slot<T>]> = (0..capacity)
      .map(|index| Slot {
        serial: index as u32,
        state: SlotState::Free,
      })
      .collect();

    Self {
      slots,
      names: HashMap::with_capacity(capacity),
      last: capacity - 1,
      len: 0,
    }
  }

  fn find_free(&self) -> Option<usize> {
    let cap: usize = self.slots.len();

    (1..=cap)
      .map(|offset| (self.last + offset) % cap)
      .find(|&index| matches!(self.slots[index].state, SlotState::Free))
  }

  /// Frees a slot and advances its serial past every ID it has issued.
  fn release(&mut self, index: usize, name: &str) {
    let cap: u32 = self.slots.len() as u32;
    let slot: &mut Slot<T> = &mut self.slots[index];

    slot.state = SlotState::Free;
    slot.serial = next_serial(slot.serial, cap);

    self.names.remove(name);
    self.len -= 1;
  }
}

/// A single entry in the slot arena.
///
/// `serial` is the serial of the occupant while the slot is claimed, and the
/// serial the next occupant will receive while it is free.
struct Slot<T> {
  serial: u32,
  state: SlotState<T>,
}

enum SlotState<T> {
  Free,
  Reserved,
  Active(Arc<ObjectRecord<T>>),
  Closing(Arc<ObjectRecord<T>>),
}

/// Returns the serial following `serial` for a slot in a table of `cap`
/// entries, preserving `serial % cap`.
#[inline]
fn next_serial(serial: u32, cap: u32) -> u32 {
  match serial.checked_add(cap) {
    Some(next) if next <= ObjectId::MAX_SERIAL => next,
    _ => serial % cap,
  }
}

// -----------------------------------------------------------------------------
// Object Table - Permit
// -----------------------------------------------------------------------------

/// The right to publish one object into a reserved slot.
///
/// Dropping a permit without committing it (for example when the initializer
/// unwinds) releases the slot and its name.
struct Permit<'table, T> {
  table: &'table ObjectTable<T>,
  index: usize,
  id: ObjectId,
  name: Box<str>,
  done: bool,
}

impl<T> Permit<'_, T> {
  fn commit(mut self, data: T) -> ObjectId {
    let record: ObjectRecord<T> = ObjectRecord {
      id: self.id,
      name: self.name.clone(),
      creator: CreatorId::current(),
      data,
    };

    let mut guard: RwLockWriteGuard<'_, Table<T>> = self.table.write();

    guard.slots[self.index].state = SlotState::Active(Arc::new(record));

    drop(guard);

    self.done = true;
    self.id
  }
}

impl<T> Drop for Permit<'_, T> {
  fn drop(&mut self) {
    if !self.done {
      self.table.write().release(self.index, &self.name);
    }
  }
}

// -----------------------------------------------------------------------------
// Object Table - Closing
// -----------------------------------------------------------------------------

/// An object whose teardown is in progress.
///
/// Dropping it without releasing (teardown failed or unwound) restores the
/// object to the active state.
struct Closing<'table, T> {
  table: &'table ObjectTable<T>,
  index: usize,
  record: Arc<ObjectRecord<T>>,
  done: bool,
}

impl<T> Closing<'_, T> {
  fn release(mut self) {
    self.table.write().release(self.index, &self.record.name);
    self.table.released.notify_all();
    self.done = true;
  }
}

impl<T> Drop for Closing<'_, T> {
  fn drop(&mut self) {
    if !self.done {
      self.table.write().slots[self.index].state = SlotState::Active(Arc::clone(&self.record));
      self.table.released.notify_all();
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::panic;
  use std::panic::AssertUnwindSafe;
  use std::sync::mpsc;
  use std::thread;
  use std::time::Duration;

  use crate::core::CreatorId;
  use crate::core::ObjectId;
  use crate::core::ObjectKind;
  use crate::core::ObjectTable;
  use crate::error::OsalError;

  fn table(capacity: usize) -> ObjectTable<u64> {
    ObjectTable::new(ObjectKind::Queue, capacity, 8)
  }

  #[test]
  fn test_create_lookup() {
    let table: ObjectTable<u64> = table(4);
    let id: ObjectId = table.create("a", |_| Ok(1)).unwrap();

    assert_eq!(id.kind(), Some(ObjectKind::Queue));
    assert_eq!(table.lookup_by_name("a"), Ok(id));
    assert_eq!(table.get(id).unwrap().name(), "a");
    assert_eq!(table.get(id).unwrap().creator(), CreatorId::current());
    assert_eq!(table.create("a", |_| Ok(2)), Err(OsalError::NameTaken));
  }

  #[test]
  fn test_name_validation() {
    let table: ObjectTable<u64> = table(4);

    assert_eq!(table.create("", |_| Ok(0)), Err(OsalError::InvalidArgument));
    assert_eq!(table.create("123456789", |_| Ok(0)), Err(OsalError::NameTooLong));
    assert!(table.create("12345678", |_| Ok(0)).is_ok());
    assert_eq!(table.lookup_by_name("nope"), Err(OsalError::NameNotFound));
  }

  #[test]
  fn test_stale_id() {
    let table: ObjectTable<u64> = table(1);
    let old: ObjectId = table.create("a", |_| Ok(1)).unwrap();

    table.delete(old, |_| Ok(())).unwrap();

    let new: ObjectId = table.create("a", |_| Ok(2)).unwrap();

    assert_ne!(old, new);
    assert_eq!(table.index_of(old), table.index_of(new));
    assert_eq!(table.get(old).unwrap_err(), OsalError::InvalidId);
    assert_eq!(table.delete(old, |_| Ok(())), Err(OsalError::InvalidId));
    assert_eq!(**table.get(new).unwrap(), 2);
  }

  #[test]
  fn test_wrong_kind() {
    let table: ObjectTable<u64> = table(4);
    let id: ObjectId = table.create("a", |_| Ok(1)).unwrap();
    let alien: ObjectId = ObjectId::new(ObjectKind::Task, id.serial());

    assert_eq!(table.get(alien).unwrap_err(), OsalError::InvalidId);
    assert_eq!(table.get(ObjectId::UNDEFINED).unwrap_err(), OsalError::InvalidId);
  }

  #[test]
  fn test_capacity() {
    let table: ObjectTable<u64> = table(3);
    let ids: Vec<ObjectId> = ["a", "b", "c"]
      .iter()
      .map(|name| table.create(name, |_| Ok(0)).unwrap())
      .collect();

    assert_eq!(table.create("d", |_| Ok(0)), Err(OsalError::NoFreeSlots));

    table.delete(ids[1], |_| Ok(())).unwrap();

    assert!(table.create("d", |_| Ok(0)).is_ok());
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn test_init_failure_releases_name() {
    let table: ObjectTable<u64> = table(1);

    assert_eq!(
      table.create("a", |_| Err(OsalError::Internal)),
      Err(OsalError::Internal),
    );
    assert!(table.is_empty());
    assert_eq!(table.lookup_by_name("a"), Err(OsalError::NameNotFound));
    assert!(table.create("a", |_| Ok(0)).is_ok());
  }

  #[test]
  fn test_init_panic_releases_slot() {
    let table: ObjectTable<u64> = table(1);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
      table.create("a", |_| panic!("init exploded"))
    }));

    assert!(result.is_err());
    assert!(table.is_empty());
    assert!(table.create("a", |_| Ok(0)).is_ok());
  }

  #[test]
  fn test_init_sees_published_id() {
    let table: ObjectTable<u64> = table(4);
    let mut seen: ObjectId = ObjectId::UNDEFINED;

    let id: ObjectId = table
      .create("a", |id| {
        seen = id;
        Ok(0)
      })
      .unwrap();

    assert_eq!(seen, id);
  }

  #[test]
  fn test_reserved_invisible() {
    let table: ObjectTable<u64> = table(4);

    table
      .create("a", |id| {
        assert_eq!(table.get(id).unwrap_err(), OsalError::InvalidId);
        assert_eq!(table.lookup_by_name("a"), Err(OsalError::NameNotFound));
        assert_eq!(table.create("a", |_| Ok(0)), Err(OsalError::NameTaken));
        Ok(0)
      })
      .unwrap();
  }

  #[test]
  fn test_teardown_failure_keeps_object() {
    let table: ObjectTable<u64> = table(4);
    let id: ObjectId = table.create("a", |_| Ok(9)).unwrap();

    assert_eq!(
      table.delete(id, |_| Err(OsalError::ResourceBusy)),
      Err(OsalError::ResourceBusy),
    );
    assert_eq!(**table.get(id).unwrap(), 9);
    assert_eq!(table.lookup_by_name("a"), Ok(id));
    assert!(table.delete(id, |_| Ok(())).is_ok());
  }

  #[test]
  fn test_try_delete_skips_closing_object() {
    let table: ObjectTable<u64> = table(4);
    let table: &ObjectTable<u64> = &table;
    let id: ObjectId = table.create("a", |_| Ok(1)).unwrap();
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();

    thread::scope(|scope| {
      let closer = scope.spawn(move || {
        table.delete(id, move |_| {
          entered_tx.send(()).unwrap();
          resume_rx.recv().unwrap();
          Ok(())
        })
      });

      entered_rx.recv().unwrap();

      assert_eq!(table.try_delete(id, |_| Ok(())), Err(OsalError::InvalidId));

      let waiter = scope.spawn(move || table.delete(id, |_| Ok(())));

      thread::sleep(Duration::from_millis(20));
      resume_tx.send(()).unwrap();

      assert_eq!(closer.join().unwrap(), Ok(()));
      assert_eq!(waiter.join().unwrap(), Err(OsalError::InvalidId));
    });

    assert!(table.is_empty());
  }

  #[test]
  fn test_failed_teardown_wakes_waiting_delete() {
    let table: ObjectTable<u64> = table(4);
    let table: &ObjectTable<u64> = &table;
    let id: ObjectId = table.create("a", |_| Ok(1)).unwrap();
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();

    thread::scope(|scope| {
      let closer = scope.spawn(move || {
        table.delete(id, move |_| {
          entered_tx.send(()).unwrap();
          resume_rx.recv().unwrap();
          Err(OsalError::ResourceBusy)
        })
      });

      entered_rx.recv().unwrap();

      let waiter = scope.spawn(move || table.delete(id, |_| Ok(())));

      thread::sleep(Duration::from_millis(20));
      resume_tx.send(()).unwrap();

      assert_eq!(closer.join().unwrap(), Err(OsalError::ResourceBusy));
      assert_eq!(waiter.join().unwrap(), Ok(()));
    });

    assert_eq!(table.get(id).unwrap_err(), OsalError::InvalidId);
  }

  #[test]
  fn test_for_each_creator_filter() {
    let table: ObjectTable<u64> = table(8);

    let mine: ObjectId = table.create("mine", |_| Ok(0)).unwrap();
    let theirs: ObjectId = thread::scope(|scope| {
      scope
        .spawn(|| table.create("theirs", |_| Ok(0)).unwrap())
        .join()
        .unwrap()
    });

    let mut all: Vec<ObjectId> = Vec::new();
    let mut own: Vec<ObjectId> = Vec::new();

    table.for_each(None, |id| all.push(id));
    table.for_each(Some(CreatorId::current()), |id| own.push(id));

    assert_eq!(all.len(), 2);
    assert!(all.contains(&theirs));
    assert_eq!(own, vec![mine]);
  }

  #[test]
  fn test_for_each_visitor_may_delete() {
    let table: ObjectTable<u64> = table(8);

    for name in ["a", "b", "c"] {
      table.create(name, |_| Ok(0)).unwrap();
    }

    table.for_each(None, |id| table.delete(id, |_| Ok(())).unwrap());

    assert!(table.is_empty());
    assert!(table.ids().is_empty());
  }

  #[test]
  fn test_round_robin_reuse() {
    let table: ObjectTable<u64> = table(4);
    let a: ObjectId = table.create("a", |_| Ok(0)).unwrap();

    table.delete(a, |_| Ok(())).unwrap();

    let b: ObjectId = table.create("b", |_| Ok(0)).unwrap();

    assert_ne!(table.index_of(a), table.index_of(b));
  }

  #[test]
  fn test_serial_wraps_preserving_index() {
    let cap: u32 = 3;
    let mut serial: u32 = 2;

    for _ in 0..10_000_000 {
      let next: u32 = super::next_serial(serial, cap);

      assert_eq!(next % cap, 2);
      assert!(next <= ObjectId::MAX_SERIAL);

      if next < serial {
        return;
      }

      serial = next;
    }

    panic!("serial never wrapped");
  }

  #[test]
  fn stress_concurrent_create_delete() {
    let table: ObjectTable<u64> = table(16);

    thread::scope(|scope| {
      for worker in 0..8 {
        let table: &ObjectTable<u64> = &table;

        scope.spawn(move || {
          for round in 0..200 {
            let name: String = format!("w{worker}-{}", round % 3);

            if let Ok(id) = table.create(&name, |_| Ok(worker)) {
              assert_eq!(**table.get(id).unwrap(), worker);
              table.delete(id, |_| Ok(())).unwrap();
              assert_eq!(table.get(id).unwrap_err(), OsalError::InvalidId);
            }
          }
        });
      }
    });

    assert!(table.is_empty());
  }
}
