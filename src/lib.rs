//! OSAL - the object registry and timebase scheduler of an operating system
//! abstraction layer.
//!
//! This crate provides the two facilities every other OSAL service is built
//! on: a generic, generation-checked object registry and a soft-real-time
//! timebase/timer callback scheduler driven by a pluggable platform tick
//! source.
//!
//! # Quick Start
//!
//! ```no_run
//! use osal::api::Osal;
//! use osal::api::OsalConfig;
//! use osal::platform::HostPlatform;
//! use osal::platform::SyncMode;
//!
//! let osal: Osal = Osal::new(OsalConfig::default(), HostPlatform::new());
//!
//! let tb = osal.timebase_create("tb-1hz", SyncMode::InternalFreeRun).unwrap();
//! osal.timebase_set(tb, 1_000_000, 1_000_000).unwrap();
//!
//! let tm = osal.timer_add("heartbeat", tb, |id| println!("tick from {id}")).unwrap();
//! osal.timer_set(tm, 1_000_000, 1_000_000).unwrap();
//! ```
//!
//! # Core Modules
//!
//! - [`api`]: The [`Osal`] facade and its configuration
//! - [`core`]: Object IDs and the generic object table
//! - [`platform`]: Tick source adapters
//! - [`error`]: Error taxonomy
//! - [`consts`]: Compile-time defaults
//!
//! [`Osal`]: crate::api::Osal

mod loom;
mod ops;
mod sched;
mod utils;

pub mod api;
pub mod consts;
pub mod core;
pub mod error;
pub mod init;
pub mod platform;
