//! timer is the core module of the library, it holds the run loop that
//! delivers ticks, the rendezvous sequence ticks are pulled from, and the
//! bookkeeping that lets a run be cancelled and awaited.

pub mod sequence;
pub(crate) mod timer_core;

pub mod runtime_trace;
