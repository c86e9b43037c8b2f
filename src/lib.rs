//! tick_timer is a cancellable, repeatable interval timer.
//!
//! Once started, a [`Timer`](crate::entity::Timer) waits its fixed delay,
//! delivers one tick, and does it again, until it is stopped, restarted or
//! its repeat limit is used up.
//!
//! # Two ways to receive ticks
//!
//! 1. Push: [`Timer::start`](crate::entity::Timer::start) invokes a callback on every tick.
//! 2. Pull: [`Timer::start_sequence`](crate::entity::Timer::start_sequence) returns a
//!    [`TickSequence`](crate::timer::sequence::TickSequence), a rendezvous queue the
//!    caller reads at its own pace. A tick is only handed over when somebody is
//!    waiting for it, and a stopped sequence reports end-of-sequence at once.
//!
//! Both modes run on an explicit [`SchedulingContext`](crate::entity::SchedulingContext),
//! a tokio `Handle` or a smol `Executor`, there is no hidden global runtime.
//!
//! ```no_run
//! use tick_timer::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TimerError> {
//!     let timer = Timer::with_repeat(Duration::from_millis(300), 3)?;
//!     let mut ticks = timer.start_sequence(&SchedulingContext::current_tokio());
//!
//!     while let Some(tick) = ticks.next().await {
//!         println!("{:?}", tick);
//!     }
//!
//!     assert!(!timer.is_active());
//!     Ok(())
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
pub mod macros;
pub mod entity;
pub mod error;
pub mod prelude;
pub mod timer;

cfg_status_report!(
    pub mod utils;
);

pub use crate::entity::{CallbackFailure, Repeat, SchedulingContext, Timer, TimerBuilder};
pub use crate::error::TimerError;
pub use crate::timer::sequence::{Tick, TickSequence};
