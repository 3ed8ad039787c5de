mod macros;

pub(crate) use self::macros::fatal;
