//! Core data structures shared by every OSAL operation.
//!
//! # Contents
//!
//! - [`ObjectId`]: Tagged identifier of a live object
//! - [`ObjectKind`]: Resource kind encoded in every ID
//! - [`CreatorId`]: Identity of the thread that created an object
//! - [`ObjectTable`]: Fixed-capacity registry of named objects

mod error;
mod state;
mod table;
mod types;

pub(crate) use self::error::fatal;
pub(crate) use self::state::CallbackRing;
pub(crate) use self::state::Due;
pub(crate) use self::state::RingNode;
pub(crate) use self::state::TimeBase;
pub(crate) use self::state::TimeBaseShared;
pub(crate) use self::state::TimeBaseState;
pub(crate) use self::state::TimerCallback;
pub(crate) use self::state::TimerCb;

pub use self::state::TimerFlags;
pub use self::table::ObjectRecord;
pub use self::table::ObjectTable;
pub use self::types::CreatorId;
pub use self::types::ObjectId;
pub use self::types::ObjectKind;
