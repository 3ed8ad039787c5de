mod callback_ring;
mod timebase;
mod timer;

pub(crate) use self::callback_ring::CallbackRing;
pub(crate) use self::callback_ring::Due;
pub(crate) use self::callback_ring::RingNode;
pub(crate) use self::timebase::TimeBase;
pub(crate) use self::timebase::TimeBaseShared;
pub(crate) use self::timebase::TimeBaseState;
pub(crate) use self::timer::TimerCallback;
pub(crate) use self::timer::TimerCb;

pub use self::timer::TimerFlags;
