use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// The resource kind encoded in the tag field of an [`ObjectId`].
///
/// Every OSAL facility owns one object table per kind. Only the timebase and
/// timer tables are managed by this crate; the remaining tags are reserved so
/// that IDs minted by sibling facilities never collide.
///
/// [`ObjectId`]: crate::core::ObjectId
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[non_exhaustive]
pub enum ObjectKind {
  Task = 0x01,
  Queue = 0x02,
  CountSem = 0x03,
  BinSem = 0x04,
  Mutex = 0x05,
  Stream = 0x06,
  Dir = 0x07,
  TimeBase = 0x08,
  TimerCb = 0x09,
  Module = 0x0A,
  FileSys = 0x0B,
  Console = 0x0C,
  CondVar = 0x0D,
}

impl ObjectKind {
  /// Every kind, in tag order.
  pub const ALL: [Self; 13] = [
    Self::Task,
    Self::Queue,
    Self::CountSem,
    Self::BinSem,
    Self::Mutex,
    Self::Stream,
    Self::Dir,
    Self::TimeBase,
    Self::TimerCb,
    Self::Module,
    Self::FileSys,
    Self::Console,
    Self::CondVar,
  ];

  /// Returns the kind with the given tag value.
  #[inline]
  pub const fn from_tag(tag: u8) -> Option<Self> {
    match tag {
      0x01 => Some(Self::Task),
      0x02 => Some(Self::Queue),
      0x03 => Some(Self::CountSem),
      0x04 => Some(Self::BinSem),
      0x05 => Some(Self::Mutex),
      0x06 => Some(Self::Stream),
      0x07 => Some(Self::Dir),
      0x08 => Some(Self::TimeBase),
      0x09 => Some(Self::TimerCb),
      0x0A => Some(Self::Module),
      0x0B => Some(Self::FileSys),
      0x0C => Some(Self::Console),
      0x0D => Some(Self::CondVar),
      _ => None,
    }
  }

  /// Returns the tag value of this kind.
  #[inline]
  pub const fn tag(self) -> u8 {
    self as u8
  }

  #[inline]
  pub(crate) const fn label(self) -> &'static str {
    match self {
      Self::Task => "task",
      Self::Queue => "queue",
      Self::CountSem => "countsem",
      Self::BinSem => "binsem",
      Self::Mutex => "mutex",
      Self::Stream => "stream",
      Self::Dir => "dir",
      Self::TimeBase => "timebase",
      Self::TimerCb => "timercb",
      Self::Module => "module",
      Self::FileSys => "filesys",
      Self::Console => "console",
      Self::CondVar => "condvar",
    }
  }
}

impl Display for ObjectKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.write_str(self.label())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
