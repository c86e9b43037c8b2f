//! The run loop.
//!
//! Every `start` builds one `RunRoutine` and spawns it. The routine waits the
//! delay, delivers one tick, lets the timer evaluate its repeat constraints,
//! and goes around again while its `Motivation` is running.

use crate::entity::{HandedOff, TimerShared};
use crate::prelude::*;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Weak;
use std::time::Duration;

/// Callback invoked on every tick in callback mode.
pub(crate) type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// How a run delivers its ticks.
pub(crate) enum Delivery {
    /// Invoke a callback on the run task.
    Callback(TickCallback),
    /// Hand a tick to a `TickSequence` receiver, waiting for one if needed.
    HandOff(HandOff),
}

impl Delivery {
    fn mode(&self) -> &'static str {
        match self {
            Delivery::Callback(_) => "callback",
            Delivery::HandOff(_) => "sequence",
        }
    }
}

/// What happened to one tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Delivered {
    /// The tick reached its consumer.
    Tick,
    /// The tick was not delivered and the run should end.
    Halt,
}

pub(crate) struct RunRoutine {
    pub(crate) run_id: u64,
    pub(crate) delay: Duration,
    pub(crate) motivation: Arc<Motivation>,
    pub(crate) delivery: Delivery,
    // Weak, so a forgotten timer does not keep its run alive.
    pub(crate) timer: Weak<TimerShared>,
}

impl RunRoutine {
    pub(crate) async fn run(mut self) {
        debug!("run {} started in {} mode", self.run_id, self.delivery.mode());

        while self.motivation.is_active() {
            if !wait_delay(self.delay, &self.motivation).await {
                break;
            }

            if self.deliver().await == Delivered::Halt {
                break;
            }
        }

        if let Some(timer) = self.timer.upgrade() {
            timer.run_exited(self.run_id);
        }

        debug!(
            "run {} exited with state {}",
            self.run_id,
            self.motivation.state()
        );
    }

    async fn deliver(&mut self) -> Delivered {
        match &mut self.delivery {
            Delivery::Callback(callback) => {
                if !self.motivation.is_active() {
                    return Delivered::Halt;
                }

                trace!("run {} invoking tick callback", self.run_id);

                let outcome = if catch_unwind(AssertUnwindSafe(|| callback())).is_ok() {
                    Delivered::Tick
                } else {
                    match self.timer.upgrade() {
                        Some(timer) => timer.callback_panicked(self.run_id),
                        None => Delivered::Halt,
                    }
                };

                if outcome == Delivered::Halt {
                    return Delivered::Halt;
                }

                match self.timer.upgrade() {
                    Some(timer) => {
                        timer.tick_delivered(self.run_id);
                        Delivered::Tick
                    }
                    None => {
                        debug!("run {} outlived its timer", self.run_id);
                        Delivered::Halt
                    }
                }
            }

            Delivery::HandOff(hand_off) => loop {
                let ticket = match hand_off.next_ticket(&self.motivation).await {
                    Some(ticket) => ticket,
                    None => return Delivered::Halt,
                };

                let timer = match self.timer.upgrade() {
                    Some(timer) => timer,
                    None => {
                        debug!("run {} outlived its timer", self.run_id);
                        return Delivered::Halt;
                    }
                };

                match timer.hand_off_tick(self.run_id, ticket) {
                    HandedOff::Delivered => {
                        trace!("run {} handed off a tick", self.run_id);
                        return Delivered::Tick;
                    }
                    HandedOff::ReceiverGone => continue,
                    HandedOff::RunOver => return Delivered::Halt,
                }
            },
        }
    }
}

/// Sleep for `delay`, returns false if the run was finished meanwhile.
async fn wait_delay(delay: Duration, motivation: &Motivation) -> bool {
    // A zero delay is ready at once, give the executor a turn anyway.
    if delay == Duration::from_secs(0) {
        yield_now().await;
        return motivation.is_active();
    }

    let sleep = AsyncTimer::after(delay);
    let cancelled = motivation.cancelled();
    futures::pin_mut!(sleep, cancelled);

    match select(sleep, cancelled).await {
        Either::Left(_) => motivation.is_active(),
        Either::Right(_) => false,
    }
}

impl TimerShared {
    /// Decide what a run does after its callback panicked.
    fn callback_panicked(&self, run_id: u64) -> Delivered {
        match self.callback_failure {
            CallbackFailure::Continue => {
                error!("tick callback of run {} panicked, run continues", run_id);
                Delivered::Tick
            }
            CallbackFailure::StopRun => {
                error!("tick callback of run {} panicked, stopping the run", run_id);
                self.finish_run_if_current(run_id, run::CANCELLED);
                Delivered::Halt
            }
        }
    }
}
