//! Utility types and functions used throughout the crate.
//!
//! # Contents
//!
//! - [`Latch`]: One-shot value handoff with a bounded wait
//! - [`measure_fn`]: Wall-clock timing of a closure

mod latch;
mod time;

pub(crate) use self::latch::Latch;
pub(crate) use self::time::duration_micros;
pub(crate) use self::time::measure_fn;
