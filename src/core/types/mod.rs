//! Identifier types shared by every object table.
//!
//! - [`ObjectId`]: Kind-tagged, serial-checked object handle
//! - [`ObjectKind`]: Resource kind encoded in an [`ObjectId`]
//! - [`CreatorId`]: Identity of the thread that created an object

mod creator_id;
mod object_id;
mod object_kind;

pub use self::creator_id::CreatorId;
pub use self::object_id::ObjectId;
pub use self::object_kind::ObjectKind;
