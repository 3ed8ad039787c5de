use hashbrown::HashMap;
use hashbrown::HashSet;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;

use crate::core::ObjectId;
use crate::error::OsalError;
use crate::platform::Platform;
use crate::platform::SyncMode;
use crate::platform::TickRequest;
use crate::platform::TickSink;
use crate::platform::TickSource;

const SIM_ACCURACY: u32 = 1;

// -----------------------------------------------------------------------------
// Sim Platform
// -----------------------------------------------------------------------------

/// Deterministic platform adapter.
///
/// No ticks are ever generated on their own; tests and ground tools inject
/// them with [`tick`](Self::tick), [`tick_nominal`](Self::tick_nominal) and
/// [`pulse`](Self::pulse). Ticks are queued to the service loop and processed
/// in order.
pub struct SimPlatform {
  state: Arc<Mutex<SimState>>,
}

struct SimState {
  attached: HashMap<ObjectId, SimLine>,
  sync_sources: HashSet<Box<str>>,
  fail_next: Option<OsalError>,
  acquired: usize,
}

struct SimLine {
  mode: SyncMode,
  sink: TickSink,
  program: Option<(u32, u32)>,
  posted: u64,
}

impl SimLine {
  fn post(&mut self, elapsed: u32) -> bool {
    let sent: bool = self.sink.post(elapsed);
    self.posted += u64::from(sent);
    sent
  }
}

impl SimPlatform {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      state: Arc::new(Mutex::new(SimState {
        attached: HashMap::new(),
        sync_sources: HashSet::new(),
        fail_next: None,
        acquired: 0,
      })),
    })
  }

  /// Registers an external sync line that timebases may attach to.
  pub fn add_sync_source(&self, name: &str) {
    self.lock().sync_sources.insert(name.into());
  }

  /// Makes the next tick source acquisition fail with `error`.
  pub fn fail_next_acquire(&self, error: OsalError) {
    self.lock().fail_next = Some(error);
  }

  /// Posts a tick of `elapsed` microseconds to the given timebase.
  ///
  /// Returns `false` if no live service loop is attached.
  pub fn tick(&self, timebase: ObjectId, elapsed: u32) -> bool {
    self
      .lock()
      .attached
      .get_mut(&timebase)
      .is_some_and(|line| line.post(elapsed))
  }

  /// Posts a tick of one nominal interval to the given timebase.
  #[inline]
  pub fn tick_nominal(&self, timebase: ObjectId) -> bool {
    self.tick(timebase, 0)
  }

  /// Posts a tick to every timebase synchronized to the named line.
  ///
  /// Returns the number of service loops the tick reached.
  pub fn pulse(&self, line: &str, elapsed: u32) -> usize {
    self
      .lock()
      .attached
      .values_mut()
      .filter(|item| matches!(&item.mode, SyncMode::ExternalSync(name) if name == line))
      .filter_map(|item| item.post(elapsed).then_some(()))
      .count()
  }

  /// Returns the last `(start, interval)` programmed for the timebase.
  pub fn programmed(&self, timebase: ObjectId) -> Option<(u32, u32)> {
    self.lock().attached.get(&timebase).and_then(|line| line.program)
  }

  /// Returns the number of ticks delivered to the timebase so far.
  pub fn posted(&self, timebase: ObjectId) -> u64 {
    self.lock().attached.get(&timebase).map_or(0, |line| line.posted)
  }

  /// Returns `true` if a tick source is attached to the timebase.
  pub fn is_attached(&self, timebase: ObjectId) -> bool {
    self.lock().attached.contains_key(&timebase)
  }

  /// Returns the number of attached tick sources.
  pub fn attached(&self) -> usize {
    self.lock().attached.len()
  }

  /// Returns the number of successful acquisitions so far.
  pub fn acquired(&self) -> usize {
    self.lock().acquired
  }

  #[inline]
  fn lock(&self) -> MutexGuard<'_, SimState> {
    self.state.lock()
  }
}

impl Platform for SimPlatform {
  fn name(&self) -> &'static str {
    "sim"
  }

  fn acquire_tick_source(
    &self,
    request: TickRequest<'_>,
  ) -> Result<Box<dyn TickSource>, OsalError> {
    let mut state: MutexGuard<'_, SimState> = self.lock();

    if let Some(error) = state.fail_next.take() {
      return Err(error);
    }

    if let SyncMode::ExternalSync(name) = request.mode {
      if !state.sync_sources.contains(name.as_str()) {
        return Err(OsalError::NameNotFound);
      }
    }

    state.acquired += 1;
    state.attached.insert(
      request.timebase,
      SimLine {
        mode: request.mode.clone(),
        sink: request.sink,
        program: None,
        posted: 0,
      },
    );

    Ok(Box::new(SimSource {
      state: Arc::clone(&self.state),
      timebase: request.timebase,
    }))
  }
}

impl Debug for SimPlatform {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let state: MutexGuard<'_, SimState> = self.lock();

    f.debug_struct("SimPlatform")
      .field("attached", &state.attached.len())
      .field("sync_sources", &state.sync_sources)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Sim Source
// -----------------------------------------------------------------------------

struct SimSource {
  state: Arc<Mutex<SimState>>,
  timebase: ObjectId,
}

impl TickSource for SimSource {
  fn accuracy(&self) -> u32 {
    SIM_ACCURACY
  }

  fn program(&mut self, start: u32, interval: u32) -> Result<(), OsalError> {
    let mut state: MutexGuard<'_, SimState> = self.state.lock();

    let Some(line) = state.attached.get_mut(&self.timebase) else {
      return Err(OsalError::InvalidId);
    };

    line.program = Some((start, interval));

    Ok(())
  }

  fn release(&mut self) {
    self.state.lock().attached.remove(&self.timebase);
  }
}
