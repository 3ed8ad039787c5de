use hashbrown::HashMap;
use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use parking_lot::WaitTimeoutResult;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::consts::HOST_CLOCK_ACCURACY;
use crate::core::ObjectId;
use crate::error::OsalError;
use crate::platform::Platform;
use crate::platform::SyncMode;
use crate::platform::TickRequest;
use crate::platform::TickSink;
use crate::platform::TickSource;
use crate::utils::duration_micros;

// -----------------------------------------------------------------------------
// Host Platform
// -----------------------------------------------------------------------------

/// Platform adapter backed by the host's monotonic clock.
///
/// Free-running timebases get a clock thread each, which sleeps to absolute
/// deadlines and posts the measured elapsed time. Externally synchronized
/// timebases subscribe to a named [`PulseLine`].
pub struct HostPlatform {
  accuracy: u32,
  lines: Mutex<HashMap<Box<str>, Arc<PulseLine>>>,
}

impl HostPlatform {
  /// Creates a host platform reporting the default clock accuracy.
  #[inline]
  pub fn new() -> Arc<Self> {
    Self::with_accuracy(HOST_CLOCK_ACCURACY)
  }

  /// Creates a host platform reporting the given accuracy in microseconds.
  pub fn with_accuracy(accuracy: u32) -> Arc<Self> {
    Arc::new(Self {
      accuracy,
      lines: Mutex::new(HashMap::new()),
    })
  }

  /// Returns the pulse line with the given name, creating it if needed.
  pub fn pulse_line(&self, name: &str) -> Arc<PulseLine> {
    let mut lines: MutexGuard<'_, HashMap<Box<str>, Arc<PulseLine>>> = self.lines.lock();

    if let Some(line) = lines.get(name) {
      return Arc::clone(line);
    }

    let line: Arc<PulseLine> = Arc::new(PulseLine {
      name: name.into(),
      subscribers: Mutex::new(Vec::new()),
    });

    lines.insert(name.into(), Arc::clone(&line));
    line
  }
}

impl Platform for HostPlatform {
  fn name(&self) -> &'static str {
    "host"
  }

  fn acquire_tick_source(
    &self,
    request: TickRequest<'_>,
  ) -> Result<Box<dyn TickSource>, OsalError> {
    match request.mode {
      SyncMode::InternalFreeRun => {
        let source: ClockSource = ClockSource::spawn(request.name, request.sink, self.accuracy)?;
        Ok(Box::new(source))
      }
      SyncMode::ExternalSync(name) => {
        let Some(line) = self.lines.lock().get(name.as_str()).map(Arc::clone) else {
          return Err(OsalError::NameNotFound);
        };

        line.subscribers.lock().push(request.sink);

        Ok(Box::new(PulseSource {
          line,
          timebase: request.timebase,
          accuracy: self.accuracy,
        }))
      }
    }
  }
}

impl Debug for HostPlatform {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("HostPlatform")
      .field("accuracy", &self.accuracy)
      .field("lines", &self.lines.lock().len())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Pulse Line
// -----------------------------------------------------------------------------

/// A named external synchronization signal.
///
/// Every timebase created with [`SyncMode::ExternalSync`] naming this line
/// receives one tick per [`fire`](Self::fire).
pub struct PulseLine {
  name: Box<str>,
  subscribers: Mutex<Vec<TickSink>>,
}

impl PulseLine {
  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Delivers one tick of `elapsed` microseconds to every subscriber.
  ///
  /// Returns the number of service loops the tick reached.
  pub fn fire(&self, elapsed: u32) -> usize {
    let subscribers: MutexGuard<'_, Vec<TickSink>> = self.subscribers.lock();

    subscribers.iter().filter(|sink| sink.post(elapsed)).count()
  }

  /// Returns the number of timebases synchronized to this line.
  #[inline]
  pub fn subscribers(&self) -> usize {
    self.subscribers.lock().len()
  }
}

impl Debug for PulseLine {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("PulseLine")
      .field("name", &self.name)
      .field("subscribers", &self.subscribers())
      .finish()
  }
}

struct PulseSource {
  line: Arc<PulseLine>,
  timebase: ObjectId,
  accuracy: u32,
}

impl TickSource for PulseSource {
  fn accuracy(&self) -> u32 {
    self.accuracy
  }

  fn release(&mut self) {
    self
      .line
      .subscribers
      .lock()
      .retain(|sink| sink.timebase() != self.timebase);
  }
}

// -----------------------------------------------------------------------------
// Clock Source
// -----------------------------------------------------------------------------

struct ClockState {
  /// Last instant a tick was posted, or the source was programmed.
  last: Instant,
  deadline: Option<Instant>,
  interval: Option<Duration>,
  stop: bool,
}

struct ClockShared {
  state: Mutex<ClockState>,
  wake: Condvar,
}

struct ClockSource {
  shared: Arc<ClockShared>,
  thread: Option<JoinHandle<()>>,
  accuracy: u32,
}

impl ClockSource {
  fn spawn(name: &str, sink: TickSink, accuracy: u32) -> Result<Self, OsalError> {
    let shared: Arc<ClockShared> = Arc::new(ClockShared {
      state: Mutex::new(ClockState {
        last: Instant::now(),
        deadline: None,
        interval: None,
        stop: false,
      }),
      wake: Condvar::new(),
    });

    let thread: JoinHandle<()> = thread::Builder::new()
      .name(format!("osal-clock-{name}"))
      .spawn({
        let shared: Arc<ClockShared> = Arc::clone(&shared);
        move || clock_task(shared, sink)
      })
      .map_err(|_| OsalError::Internal)?;

    Ok(Self {
      shared,
      thread: Some(thread),
      accuracy,
    })
  }
}

impl TickSource for ClockSource {
  fn accuracy(&self) -> u32 {
    self.accuracy
  }

  fn program(&mut self, start: u32, interval: u32) -> Result<(), OsalError> {
    let mut state: MutexGuard<'_, ClockState> = self.shared.state.lock();
    let now: Instant = Instant::now();

    let first: u32 = if start > 0 { start } else { interval };

    state.last = now;
    state.interval = (interval > 0).then(|| Duration::from_micros(u64::from(interval)));
    state.deadline = (first > 0).then(|| now + Duration::from_micros(u64::from(first)));

    self.shared.wake.notify_one();

    Ok(())
  }

  fn release(&mut self) {
    self.shared.state.lock().stop = true;
    self.shared.wake.notify_one();

    if let Some(thread) = self.thread.take() {
      if thread.join().is_err() {
        warn!(target: "osal", "clock thread panicked");
      }
    }
  }
}

impl Drop for ClockSource {
  fn drop(&mut self) {
    self.release();
  }
}

fn clock_task(shared: Arc<ClockShared>, sink: TickSink) {
  let timebase: ObjectId = sink.timebase();
  let mut state: MutexGuard<'_, ClockState> = shared.state.lock();

  debug!(target: "osal", %timebase, "clock started");

  'run: loop {
    if state.stop {
      break 'run;
    }

    let Some(deadline) = state.deadline else {
      shared.wake.wait(&mut state);
      continue 'run;
    };

    let now: Instant = Instant::now();

    if now < deadline {
      let _ignore: WaitTimeoutResult = shared.wake.wait_until(&mut state, deadline);
      continue 'run;
    }

    let elapsed: Duration = now.saturating_duration_since(state.last);

    state.last = now;

    // Skip deadlines that have already passed; the service loop folds the
    // overshoot into its backlog accounting.
    state.deadline = state.interval.map(|interval| {
      let next: Instant = deadline + interval;
      if next <= now { now + interval } else { next }
    });

    let micros: u32 = duration_micros(elapsed).max(1);

    trace!(target: "osal", %timebase, elapsed = micros, "clock tick");

    if !sink.post(micros) {
      break 'run;
    }
  }

  debug!(target: "osal", %timebase, "clock stopped");
}
