mod object_table;

pub use self::object_table::ObjectRecord;
pub use self::object_table::ObjectTable;
