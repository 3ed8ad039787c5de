//! Index-linked ring of timer callbacks attached to one timebase.
//!
//! Nodes live in a fixed arena indexed by the slot index of the owning timer
//! in the timer table, so a node can never outlive or alias its timer. The
//! ring is circular and doubly linked through arena indices:
//!
//! ```text
//!   head
//!    │
//!    ▼
//! ┌─────┐ next ┌─────┐ next ┌─────┐
//! │  3  │─────▶│  0  │─────▶│  5  │──┐
//! └─────┘◀─────└─────┘◀─────└─────┘  │
//!    ▲    prev         prev          │
//!    └───────────────────────────────┘
//! ```
//!
//! Insertion always happens at the tail (`head.prev`), so walking forward
//! from the head visits callbacks in attachment order.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::core::ObjectId;
use crate::core::TimerCallback;
use crate::core::fatal;

// -----------------------------------------------------------------------------
// Schedule
// -----------------------------------------------------------------------------

/// Countdown state of a single timer callback, in timebase units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Schedule {
  /// Time until the next firing. A value `<= 0` means the timer is idle.
  pub(crate) wait_time: i64,
  /// Period between firings; zero for one-shot timers.
  pub(crate) interval_time: u32,
  /// Start delay last programmed with `arm`.
  pub(crate) start_time: u32,
  /// Number of whole periods collapsed into a single catch-up firing.
  pub(crate) backlog_resets: u32,
}

/// Outcome of advancing a [`Schedule`] by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fire {
  /// The timer is not armed.
  Idle,
  /// The timer is armed but not yet due.
  Pending,
  /// The timer is due and fires once; `missed` whole periods were skipped.
  Due { missed: u32 },
}

impl Schedule {
  /// Arms the schedule to fire after `start` (or one `interval` if `start` is
  /// zero) and then every `interval`.
  #[inline]
  pub(crate) fn arm(&mut self, start: u32, interval: u32) {
    let first: u32 = if start > 0 { start } else { interval };

    self.wait_time = i64::from(first);
    self.interval_time = interval;
    self.start_time = start;
  }

  /// Advances the schedule by `elapsed` time units.
  ///
  /// A due timer fires exactly once regardless of how far behind it fell.
  /// Periodic timers are re-armed with the remainder of the current period,
  /// and every whole period skipped is counted in `backlog_resets`. One-shot
  /// timers go idle at zero.
  pub(crate) fn advance(&mut self, elapsed: u32) -> Fire {
    if self.wait_time <= 0 {
      return Fire::Idle;
    }

    self.wait_time -= i64::from(elapsed);

    if self.wait_time > 0 {
      return Fire::Pending;
    }

    if self.interval_time == 0 {
      self.wait_time = 0;
      return Fire::Due { missed: 0 };
    }

    let overdue: u64 = self.wait_time.unsigned_abs();
    let interval: u64 = u64::from(self.interval_time);
    let missed: u32 = u32::try_from(overdue / interval).unwrap_or(u32::MAX);

    // `overdue % interval < interval <= u32::MAX`, so this always fits.
    self.wait_time = (interval - overdue % interval) as i64;
    self.backlog_resets = self.backlog_resets.saturating_add(missed);

    Fire::Due { missed }
  }
}

// -----------------------------------------------------------------------------
// Ring Node
// -----------------------------------------------------------------------------

pub(crate) struct RingNode {
  pub(crate) id: ObjectId,
  pub(crate) schedule: Schedule,
  pub(crate) callback: TimerCallback,
  prev: usize,
  next: usize,
}

impl Debug for RingNode {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("RingNode")
      .field("id", &self.id)
      .field("schedule", &self.schedule)
      .field("prev", &self.prev)
      .field("next", &self.next)
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Due Callback
// -----------------------------------------------------------------------------

/// A callback selected for invocation during one dispatch pass.
pub(crate) struct Due {
  pub(crate) index: usize,
  pub(crate) id: ObjectId,
  pub(crate) missed: u32,
  pub(crate) callback: TimerCallback,
}

// -----------------------------------------------------------------------------
// Callback Ring
// -----------------------------------------------------------------------------

pub(crate) struct CallbackRing {
  head: Option<usize>,
  nodes: Box<[Option<RingNode>]>,
  len: usize,
}

impl CallbackRing {
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      head: None,
      nodes: (0..capacity).map(|_| None).collect(),
      len: 0,
    }
  }

  #[inline]
  pub(crate) const fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub(crate) const fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns the node at `index` if it belongs to timer `id`.
  #[inline]
  pub(crate) fn get(&self, index: usize, id: ObjectId) -> Option<&RingNode> {
    self
      .nodes
      .get(index)
      .and_then(Option::as_ref)
      .filter(|node| node.id == id)
  }

  /// Returns the node at `index` if it belongs to timer `id`.
  #[inline]
  pub(crate) fn get_mut(&mut self, index: usize, id: ObjectId) -> Option<&mut RingNode> {
    self
      .nodes
      .get_mut(index)
      .and_then(Option::as_mut)
      .filter(|node| node.id == id)
  }

  #[inline]
  pub(crate) fn contains(&self, index: usize, id: ObjectId) -> bool {
    self.get(index, id).is_some()
  }

  /// Links a new, idle node for timer `id` at the tail of the ring.
  pub(crate) fn insert_tail(&mut self, index: usize, id: ObjectId, callback: TimerCallback) {
    let Some(entry) = self.nodes.get(index) else {
      fatal!("timer index out of callback ring bounds");
    };

    if entry.is_some() {
      fatal!("timer index already linked into callback ring");
    }

    let (prev, next): (usize, usize) = match self.head {
      Some(head) => (self.node(head).prev, head),
      None => (index, index),
    };

    self.nodes[index] = Some(RingNode {
      id,
      schedule: Schedule::default(),
      callback,
      prev,
      next,
    });

    if let Some(head) = self.head {
      self.node_mut(prev).next = index;
      self.node_mut(head).prev = index;
    } else {
      self.head = Some(index);
    }

    self.len += 1;

    debug_assert_eq!(self.validate(), Ok(()));
  }

  /// Unlinks and returns the node at `index` if it belongs to timer `id`.
  pub(crate) fn remove(&mut self, index: usize, id: ObjectId) -> Option<RingNode> {
    if !self.contains(index, id) {
      return None;
    }

    let node: RingNode = self.nodes[index].take()?;

    self.len -= 1;

    if self.len == 0 {
      self.head = None;
    } else {
      self.node_mut(node.prev).next = node.next;
      self.node_mut(node.next).prev = node.prev;

      if self.head == Some(index) {
        self.head = Some(node.next);
      }
    }

    debug_assert_eq!(self.validate(), Ok(()));

    Some(node)
  }

  /// Returns the IDs of every linked timer in attachment order.
  pub(crate) fn ids(&self) -> Vec<ObjectId> {
    self.walk().map(|index| self.node(index).id).collect()
  }

  /// Advances every schedule by `elapsed` and appends the due callbacks to
  /// `due` in attachment order.
  pub(crate) fn advance(&mut self, elapsed: u32, due: &mut Vec<Due>) {
    let Some(head) = self.head else {
      return;
    };

    let mut index: usize = head;

    for _ in 0..self.len {
      let node: &mut RingNode = self.node_mut(index);

      if let Fire::Due { missed } = node.schedule.advance(elapsed) {
        due.push(Due {
          index,
          id: node.id,
          missed,
          callback: TimerCallback::clone(&node.callback),
        });
      }

      index = node.next;
    }
  }

  /// Checks the structural invariants of the ring.
  ///
  /// Every linked node is reachable exactly once walking forward from the
  /// head, back links mirror forward links, and the walk closes on the head.
  pub(crate) fn validate(&self) -> Result<(), &'static str> {
    let linked: usize = self.nodes.iter().filter(|node| node.is_some()).count();

    if linked != self.len {
      return Err("node count does not match ring length");
    }

    let Some(head) = self.head else {
      return if self.len == 0 {
        Ok(())
      } else {
        Err("non-empty ring without head")
      };
    };

    let mut seen: Vec<bool> = vec![false; self.nodes.len()];
    let mut index: usize = head;

    for _ in 0..self.len {
      let Some(node) = self.nodes.get(index).and_then(Option::as_ref) else {
        return Err("link to unoccupied slot");
      };

      if seen[index] {
        return Err("node visited twice");
      }

      seen[index] = true;

      let Some(next) = self.nodes.get(node.next).and_then(Option::as_ref) else {
        return Err("next link to unoccupied slot");
      };

      if next.prev != index {
        return Err("back link does not mirror forward link");
      }

      index = node.next;
    }

    if index != head {
      return Err("ring does not close on head");
    }

    Ok(())
  }

  fn walk(&self) -> impl Iterator<Item = usize> + '_ {
    let mut cursor: Option<usize> = self.head;

    (0..self.len).filter_map(move |_| {
      let index: usize = cursor?;
      cursor = Some(self.node(index).next);
      Some(index)
    })
  }

  #[inline]
  fn node(&self, index: usize) -> &RingNode {
    match self.nodes.get(index).and_then(Option::as_ref) {
      Some(node) => node,
      None => fatal!("dangling link in callback ring"),
    }
  }

  #[inline]
  fn node_mut(&mut self, index: usize) -> &mut RingNode {
    match self.nodes.get_mut(index).and_then(Option::as_mut) {
      Some(node) => node,
      None => fatal!("dangling link in callback ring"),
    }
  }
}

impl Debug for CallbackRing {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("CallbackRing")
      .field("head", &self.head)
      .field("len", &self.len)
      .field("ids", &self.ids())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use std::sync::Arc;

  use crate::core::ObjectId;
  use crate::core::ObjectKind;
  use crate::core::TimerCallback;
  use crate::core::state::callback_ring::CallbackRing;
  use crate::core::state::callback_ring::Due;
  use crate::core::state::callback_ring::Fire;
  use crate::core::state::callback_ring::Schedule;

  fn id(index: usize) -> ObjectId {
    ObjectId::new(ObjectKind::TimerCb, index as u32)
  }

  fn noop() -> TimerCallback {
    Arc::new(|_| {})
  }

  fn ring(indices: &[usize]) -> CallbackRing {
    let mut ring: CallbackRing = CallbackRing::new(8);

    for &index in indices {
      ring.insert_tail(index, id(index), noop());
    }

    ring
  }

  #[test]
  fn test_insert_order() {
    let ring: CallbackRing = ring(&[3, 0, 5]);

    assert_eq!(ring.ids(), vec![id(3), id(0), id(5)]);
    assert_eq!(ring.validate(), Ok(()));
  }

  #[test]
  fn test_remove_head_middle_tail() {
    let mut ring: CallbackRing = ring(&[1, 2, 3, 4]);

    assert!(ring.remove(1, id(1)).is_some());
    assert_eq!(ring.ids(), vec![id(2), id(3), id(4)]);

    assert!(ring.remove(3, id(3)).is_some());
    assert_eq!(ring.ids(), vec![id(2), id(4)]);

    assert!(ring.remove(4, id(4)).is_some());
    assert_eq!(ring.ids(), vec![id(2)]);
    assert_eq!(ring.validate(), Ok(()));

    assert!(ring.remove(2, id(2)).is_some());
    assert!(ring.is_empty());
    assert_eq!(ring.validate(), Ok(()));
  }

  #[test]
  fn test_remove_requires_matching_id() {
    let mut ring: CallbackRing = ring(&[1]);
    let stale: ObjectId = ObjectId::new(ObjectKind::TimerCb, 9);

    assert!(ring.remove(1, stale).is_none());
    assert_eq!(ring.len(), 1);
  }

  #[test]
  fn test_periodic_no_jitter() {
    let mut schedule: Schedule = Schedule::default();

    schedule.arm(0, 100);

    for _ in 0..5 {
      assert_eq!(schedule.advance(50), Fire::Pending);
      assert_eq!(schedule.advance(50), Fire::Due { missed: 0 });
      assert_eq!(schedule.wait_time, 100);
    }

    assert_eq!(schedule.backlog_resets, 0);
  }

  #[test]
  fn test_periodic_backlog_collapse() {
    let mut schedule: Schedule = Schedule::default();

    schedule.arm(100, 100);

    assert_eq!(schedule.advance(400), Fire::Due { missed: 3 });
    assert_eq!(schedule.wait_time, 100);
    assert_eq!(schedule.backlog_resets, 3);
  }

  #[test]
  fn test_periodic_overshoot_folded() {
    let mut schedule: Schedule = Schedule::default();

    schedule.arm(100, 100);

    assert_eq!(schedule.advance(130), Fire::Due { missed: 0 });
    assert_eq!(schedule.wait_time, 70);

    assert_eq!(schedule.advance(290), Fire::Due { missed: 2 });
    assert_eq!(schedule.wait_time, 80);
    assert_eq!(schedule.backlog_resets, 2);
  }

  #[test]
  fn test_one_shot() {
    let mut schedule: Schedule = Schedule::default();

    schedule.arm(250, 0);

    assert_eq!(schedule.advance(100), Fire::Pending);
    assert_eq!(schedule.advance(1000), Fire::Due { missed: 0 });
    assert_eq!(schedule.wait_time, 0);
    assert_eq!(schedule.advance(1000), Fire::Idle);
    assert_eq!(schedule.wait_time, 0);
  }

  #[test]
  fn test_unarmed_is_idle() {
    let mut schedule: Schedule = Schedule::default();

    assert_eq!(schedule.advance(1000), Fire::Idle);
    assert_eq!(schedule.wait_time, 0);
  }

  #[test]
  fn test_advance_collects_in_order() {
    let mut ring: CallbackRing = ring(&[4, 2, 6]);
    let mut due: Vec<Due> = Vec::new();

    for index in [4, 2, 6] {
      ring.get_mut(index, id(index)).unwrap().schedule.arm(10, 10);
    }

    ring.get_mut(2, id(2)).unwrap().schedule.arm(20, 20);
    ring.advance(10, &mut due);

    let fired: Vec<ObjectId> = due.iter().map(|due| due.id).collect();

    assert_eq!(fired, vec![id(4), id(6)]);
  }

  proptest! {
    #[test]
    fn prop_ring_stays_valid(ops in prop::collection::vec((any::<bool>(), 0_usize..8), 0..64)) {
      let mut ring: CallbackRing = CallbackRing::new(8);
      let mut model: Vec<usize> = Vec::new();

      for (insert, index) in ops {
        if insert && !model.contains(&index) {
          ring.insert_tail(index, id(index), noop());
          model.push(index);
        } else if !insert {
          let removed: bool = ring.remove(index, id(index)).is_some();
          prop_assert_eq!(removed, model.contains(&index));
          model.retain(|&item| item != index);
        }

        prop_assert_eq!(ring.validate(), Ok(()));
      }

      let expected: Vec<ObjectId> = model.into_iter().map(id).collect();
      prop_assert_eq!(ring.ids(), expected);
    }

    #[test]
    fn prop_periodic_never_negative(
      interval in 1_u32..10_000,
      ticks in prop::collection::vec(0_u32..50_000, 1..64),
    ) {
      let mut schedule: Schedule = Schedule::default();
      let mut backlog: u32 = 0;

      schedule.arm(interval, interval);

      for elapsed in ticks {
        let fire: Fire = schedule.advance(elapsed);

        prop_assert!(schedule.wait_time > 0);
        prop_assert!(schedule.wait_time <= i64::from(interval));
        prop_assert!(schedule.backlog_resets >= backlog);
        prop_assert_ne!(fire, Fire::Idle);

        backlog = schedule.backlog_resets;
      }
    }
  }
}
