//! A "prelude" for users of the `tick-timer` crate.
//!
//! This prelude is similar to the standard library's prelude in that you'll
//! almost always want to import its entire contents, but unlike the standard
//! library's prelude you'll have to do so manually:
//!
//! ```
//! use tick_timer::prelude::*;
//! ```
//!
//! The prelude may grow over time as additional items see ubiquitous use.

pub use crate::entity::{CallbackFailure, Repeat, RuntimeKind, SchedulingContext, Timer, TimerBuilder};
pub use crate::error::*;
pub use crate::timer::runtime_trace::state::run;
pub use crate::timer::sequence::{Tick, TickSequence};

pub use smol::channel;
pub use smol::Executor as SmolExecutor;
pub use std::time::Duration;
pub use thiserror::Error;
pub use tokio::runtime::Handle as TokioHandle;

/// State of a timer run.
pub type RunState = usize;

pub(crate) use crate::timer::runtime_trace::lifetime::Motivation;
pub(crate) use crate::timer::runtime_trace::task_handle::RunTask;
pub(crate) use crate::timer::sequence::{HandOff, SequenceTeardown, Ticket};
pub(crate) use crate::timer::timer_core::{Delivery, RunRoutine};

pub(crate) use event_listener::Event;
pub(crate) use futures::future::{select, Either};
pub(crate) use futures::FutureExt;
pub(crate) use log::{debug, error, info, trace};
pub(crate) use smol::future::yield_now;
pub(crate) use smol::Timer as AsyncTimer;
pub(crate) use std::future::Future;
pub(crate) use std::sync::Arc;
pub(crate) use tracing::{info_span, Instrument};

cfg_status_report!(
    pub use crate::utils::status_report::{PublicEvent, StatusReporter};

    pub(crate) use smol::channel::{unbounded, Receiver as AsyncReceiver, Sender as AsyncSender};
);
