use parking_lot::MutexGuard;
use std::cell::Cell;
use std::sync::Arc as StdArc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::span;
use tracing::trace;
use tracing::warn;
use triomphe::Arc;

use crate::core::Due;
use crate::core::ObjectId;
use crate::core::TimeBaseShared;
use crate::core::TimeBaseState;
use crate::error::OsalError;
use crate::platform::Platform;
use crate::platform::SyncMode;
use crate::platform::TickRequest;
use crate::platform::TickSink;
use crate::platform::TickSource;
use crate::sched::Signal;
use crate::utils::Latch;
use crate::utils::measure_fn;

type StartLatch = Latch<Result<Box<dyn TickSource>, OsalError>>;

thread_local! {
  static CONTEXT: Cell<Option<ObjectId>> = const { Cell::new(None) };
}

/// Returns the timebase whose service loop runs on the calling thread.
#[inline]
pub(crate) fn current_timebase() -> Option<ObjectId> {
  CONTEXT.try_with(Cell::get).ok().flatten()
}

// -----------------------------------------------------------------------------
// Service Handle
// -----------------------------------------------------------------------------

/// Owning handle of a running service loop thread.
#[derive(Debug)]
pub(crate) struct ServiceHandle {
  timebase: ObjectId,
  quit: UnboundedSender<Signal>,
  thread: JoinHandle<()>,
}

impl ServiceHandle {
  /// Spawns the service loop of a timebase and waits until it has attached
  /// to its tick source.
  ///
  /// # Errors
  ///
  /// - The error reported by the platform if no tick source could be acquired
  /// - [`OsalError::Timeout`] if the loop did not attach within `timeout`
  /// - [`OsalError::Internal`] if the thread could not be spawned
  pub(crate) fn start(
    shared: &Arc<TimeBaseShared>,
    name: &str,
    mode: &SyncMode,
    platform: &StdArc<dyn Platform>,
    timeout: Option<Duration>,
  ) -> Result<(Self, Box<dyn TickSource>), OsalError> {
    let timebase: ObjectId = shared.id();

    let (send, recv): (UnboundedSender<Signal>, UnboundedReceiver<Signal>) =
      mpsc::unbounded_channel();

    let latch: Arc<StartLatch> = Arc::new(Latch::new());

    let setup: Setup = Setup {
      shared: Arc::clone(shared),
      platform: StdArc::clone(platform),
      latch: Arc::clone(&latch),
      name: name.into(),
      mode: mode.clone(),
      sink: TickSink::new(timebase, send.clone()),
    };

    let thread: JoinHandle<()> = thread::Builder::new()
      .name(format!("osal-tb-{:0>2}", timebase.serial()))
      .spawn(move || task(setup, recv))
      .map_err(|_| OsalError::Internal)?;

    match latch.wait(timeout) {
      Some(Ok(source)) => {
        let this: Self = Self {
          timebase,
          quit: send,
          thread,
        };

        Ok((this, source))
      }
      Some(Err(error)) => {
        if thread.join().is_err() {
          error!(target: "osal", %timebase, "service loop faulted during start");
        }

        Err(error)
      }
      None => {
        // The loop releases its source itself once it sees the abandoned
        // latch; the thread is left detached.
        let _ignore: bool = send.send(Signal::Quit).is_ok();

        warn!(target: "osal", %timebase, ?timeout, "service loop start timed out");

        Err(OsalError::Timeout)
      }
    }
  }

  /// Stops the loop and waits for its thread to exit.
  ///
  /// Returns `false` if the loop had terminated abnormally.
  pub(crate) fn stop(self) -> bool {
    let timebase: ObjectId = self.timebase;

    if self.quit.send(Signal::Quit).is_err() {
      warn!(target: "osal", %timebase, "service loop already gone");
    }

    let (result, elapsed): (thread::Result<()>, Duration) = measure_fn(|| self.thread.join());

    match result {
      Ok(()) => {
        info!(target: "osal", %timebase, ?elapsed, "service loop stopped");
        true
      }
      Err(_) => {
        error!(target: "osal", %timebase, "service loop faulted");
        false
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Service Loop
// -----------------------------------------------------------------------------

struct Setup {
  shared: Arc<TimeBaseShared>,
  platform: StdArc<dyn Platform>,
  latch: Arc<StartLatch>,
  name: Box<str>,
  mode: SyncMode,
  sink: TickSink,
}

fn task(setup: Setup, mut recv: UnboundedReceiver<Signal>) {
  let Setup {
    shared,
    platform,
    latch,
    name,
    mode,
    sink,
  } = setup;

  let timebase: ObjectId = shared.id();
  let span: Span = span!(target: "osal", Level::DEBUG, "service-loop", %timebase);

  debug!(target: "osal", parent: &span, platform = platform.name(), "initializing");

  CONTEXT.set(Some(timebase));

  let request: TickRequest<'_> = TickRequest {
    timebase,
    name: &name,
    mode: &mode,
    sink,
  };

  let source: Box<dyn TickSource> = match platform.acquire_tick_source(request) {
    Ok(source) => source,
    Err(error) => {
      debug!(target: "osal", parent: &span, %error, "tick source unavailable");
      let _ignore: bool = latch.set(Err(error)).is_ok();
      return;
    }
  };

  shared.set_accuracy(source.accuracy());

  if let Err(Ok(mut source)) = latch.set(Ok(source)) {
    warn!(target: "osal", parent: &span, "start abandoned - releasing tick source");
    source.release();
    return;
  }

  info!(target: "osal", parent: &span, %mode, "service loop started");

  let mut worker: ServiceLoop = ServiceLoop {
    fault: FaultGuard {
      shared: Arc::clone(&shared),
      armed: true,
    },
    shared,
    span,
    due: Vec::new(),
  };

  debug!(target: "osal", parent: &worker.span, "polling");

  'run: loop {
    match recv.blocking_recv() {
      Some(Signal::Tick(elapsed)) => worker.on_tick(elapsed),
      Some(Signal::Quit) | None => break 'run,
    }
  }

  debug!(target: "osal", parent: &worker.span, "exiting");

  worker.fault.disarm();
}

struct ServiceLoop {
  shared: Arc<TimeBaseShared>,
  span: Span,
  due: Vec<Due>,
  fault: FaultGuard,
}

impl ServiceLoop {
  fn on_tick(&mut self, elapsed: u32) {
    let mut due: Vec<Due> = std::mem::take(&mut self.due);

    let elapsed: u32 = {
      let mut state: MutexGuard<'_, TimeBaseState> = self.shared.lock();

      let elapsed: u32 = if elapsed == 0 {
        state.nominal_interval_time
      } else {
        elapsed
      };

      state.freerun_time = state.freerun_time.wrapping_add(u64::from(elapsed));
      state.ticks = state.ticks.wrapping_add(1);
      state.ring.advance(elapsed, &mut due);

      elapsed
    };

    trace!(target: "osal", parent: &self.span, elapsed, due = due.len(), "tick");

    for item in due.drain(..) {
      self.dispatch(item);
    }

    self.due = due;
  }

  fn dispatch(&self, due: Due) {
    {
      let mut state: MutexGuard<'_, TimeBaseState> = self.shared.lock();

      // An earlier callback in this pass may have deleted the timer.
      if !state.ring.contains(due.index, due.id) {
        trace!(target: "osal", parent: &self.span, timer = %due.id, "skipping removed timer");
        return;
      }

      state.active = Some(due.id);
    }

    let _active: ActiveGuard<'_> = ActiveGuard {
      shared: &self.shared,
    };

    if due.missed > 0 {
      warn!(
        target: "osal",
        parent: &self.span,
        timer = %due.id,
        missed = due.missed,
        "backlog collapsed",
      );
    }

    (due.callback)(due.id);
  }
}

/// Clears the in-flight marker once a callback returns or unwinds.
struct ActiveGuard<'a> {
  shared: &'a Arc<TimeBaseShared>,
}

impl Drop for ActiveGuard<'_> {
  fn drop(&mut self) {
    self.shared.finish_callback();
  }
}

/// Marks the timebase faulted if the loop unwinds.
struct FaultGuard {
  shared: Arc<TimeBaseShared>,
  armed: bool,
}

impl FaultGuard {
  #[inline]
  fn disarm(&mut self) {
    self.armed = false;
  }
}

impl Drop for FaultGuard {
  fn drop(&mut self) {
    if self.armed && thread::panicking() {
      let timebase: ObjectId = self.shared.id();

      self.shared.mark_faulted();
      self.shared.finish_callback();

      error!(target: "osal", %timebase, "timer callback panicked - service loop terminated");
    }
  }
}
