#![allow(dead_code)]

use osal::api::Osal;
use osal::api::OsalConfig;
use osal::core::ObjectId;
use osal::platform::SimPlatform;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

pub const WAIT: Duration = Duration::from_secs(10);

pub fn sim() -> (Osal, Arc<SimPlatform>) {
  sim_with(OsalConfig::default())
}

pub fn sim_with(config: OsalConfig) -> (Osal, Arc<SimPlatform>) {
  let platform: Arc<SimPlatform> = SimPlatform::new();
  let osal: Osal = Osal::new(config, Arc::clone(&platform));

  (osal, platform)
}

/// Polls `condition` until it holds, panicking after [`WAIT`].
pub fn wait_until<F>(mut condition: F)
where
  F: FnMut() -> bool,
{
  let deadline: Instant = Instant::now() + WAIT;

  while !condition() {
    assert!(Instant::now() < deadline, "condition not reached in time");
    thread::sleep(Duration::from_millis(1));
  }
}

/// Waits until every tick posted to `timebase` so far, including the
/// callbacks it triggered, has been processed.
///
/// Posts a zero-length tick, so it must only be used while the nominal
/// interval of the timebase is zero.
pub fn flush(osal: &Osal, platform: &SimPlatform, timebase: ObjectId) {
  assert!(platform.tick_nominal(timebase));

  // The barrier tick is the last one queued; once it is counted, every
  // earlier tick has finished dispatching.
  let target: u64 = platform.posted(timebase);

  wait_until(|| osal.timebase_get_info(timebase).unwrap().ticks >= target);
}

/// Returns a callback that counts its invocations.
pub fn counter() -> (Arc<AtomicU32>, impl Fn(ObjectId) + Send + Sync + 'static) {
  let count: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
  let clone: Arc<AtomicU32> = Arc::clone(&count);

  (count, move |_| {
    clone.fetch_add(1, Ordering::SeqCst);
  })
}

#[inline]
pub fn load(count: &AtomicU32) -> u32 {
  count.load(Ordering::SeqCst)
}
