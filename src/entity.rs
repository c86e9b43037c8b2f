//! Timer is a cancellable, repeatable interval timer.
//!
//! # Timer
//!
//! One `Timer` holds at most one run at a time:
//!
//! 1. `start` / `start_sequence` stop the previous run before a new one is spawned.
//! 2. `stop` ends the run and closes its tick sequence, from any thread, any number of times.
//! 3. A run with a finite repeat limit stops itself after its last tick.

use crate::prelude::*;
use crate::timer::sequence::rendezvous;
use crate::timer::timer_core::TickCallback;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

cfg_status_report!(
    use crate::utils::status_report::StatusReporter;
);

/// How many ticks a run delivers before it stops itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Tick until stopped.
    Infinite,
    /// Stop after this many ticks.
    Times(NonZeroU64),
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Infinite
    }
}

impl From<Option<NonZeroU64>> for Repeat {
    fn from(limit: Option<NonZeroU64>) -> Self {
        limit.map_or(Repeat::Infinite, Repeat::Times)
    }
}

impl Repeat {
    /// A finite repeat limit, zero is rejected.
    pub fn times(limit: u64) -> Result<Repeat, TimerError> {
        NonZeroU64::new(limit)
            .map(Repeat::Times)
            .ok_or(TimerError::InvalidRepeatLimit(limit))
    }

    /// The limit, `None` for `Infinite`.
    pub fn limit(&self) -> Option<u64> {
        match self {
            Repeat::Infinite => None,
            Repeat::Times(limit) => Some(limit.get()),
        }
    }
}

/// What a run does when its tick callback panics.
///
/// The panic is caught and logged either way, it never reaches the runtime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallbackFailure {
    /// End the run, as if `stop()` had been called.
    StopRun,
    /// Keep ticking, the failed tick still counts toward the repeat limit.
    Continue,
}

impl Default for CallbackFailure {
    fn default() -> Self {
        CallbackFailure::StopRun
    }
}

/// Async-Runtime Kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuntimeKind {
    /// Async-Runtime `smol` compatible with the async-std
    Smol,

    /// Async-Runtime `tokio`
    Tokio,
}

/// Where the task of a run is spawned.
///
/// Passed explicitly to every start, so a run lives on an executor its
/// caller controls and can tear down.
#[derive(Clone)]
pub enum SchedulingContext {
    /// A tokio runtime.
    Tokio(TokioHandle),
    /// A smol executor, the caller is responsible for running it.
    Smol(Arc<SmolExecutor<'static>>),
}

impl SchedulingContext {
    /// The tokio runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime, as `Handle::current` does.
    pub fn current_tokio() -> SchedulingContext {
        SchedulingContext::Tokio(TokioHandle::current())
    }

    /// The runtime kind behind this context.
    pub fn kind(&self) -> RuntimeKind {
        match self {
            SchedulingContext::Tokio(_) => RuntimeKind::Tokio,
            SchedulingContext::Smol(_) => RuntimeKind::Smol,
        }
    }

    pub(crate) fn spawn<F>(&self, future: F) -> RunTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            SchedulingContext::Tokio(handle) => handle.spawn(future).into(),
            SchedulingContext::Smol(executor) => executor.spawn(future).into(),
        }
    }
}

impl fmt::Debug for SchedulingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchedulingContext")
            .field(&self.kind())
            .finish()
    }
}

impl From<TokioHandle> for SchedulingContext {
    fn from(handle: TokioHandle) -> Self {
        SchedulingContext::Tokio(handle)
    }
}

impl From<Arc<SmolExecutor<'static>>> for SchedulingContext {
    fn from(executor: Arc<SmolExecutor<'static>>) -> Self {
        SchedulingContext::Smol(executor)
    }
}

/// Builds Timer with custom configuration values.
///
/// Methods can be chained in order to set the configuration values. The
/// Timer is constructed by calling `build`.
///
/// # Examples
///
/// ```
/// use tick_timer::prelude::*;
///
/// let timer = TimerBuilder::default()
///     .delay(Duration::from_millis(300))
///     .repeat_times(3)
///     .callback_failure(CallbackFailure::Continue)
///     .build()
///     .unwrap();
///
/// assert_eq!(timer.repeat().limit(), Some(3));
/// assert!(!timer.is_active());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TimerBuilder {
    delay: Duration,
    repeat: Repeat,
    // A zero limit is only reported by `build`.
    invalid_repeat: Option<u64>,
    callback_failure: CallbackFailure,
    /// Whether or not to enable the status-report
    #[cfg(feature = "status-report")]
    enable_status_report: bool,
}

impl TimerBuilder {
    /// Time between two ticks, and before the first one.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Repeat configuration, `Repeat::Infinite` by default.
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self.invalid_repeat = None;
        self
    }

    /// Stop each run after `limit` ticks. Zero makes `build` fail.
    pub fn repeat_times(mut self, limit: u64) -> Self {
        match Repeat::times(limit) {
            Ok(repeat) => {
                self.repeat = repeat;
                self.invalid_repeat = None;
            }
            Err(_) => self.invalid_repeat = Some(limit),
        }
        self
    }

    /// What a run does when its callback panics, `CallbackFailure::StopRun` by default.
    pub fn callback_failure(mut self, callback_failure: CallbackFailure) -> Self {
        self.callback_failure = callback_failure;
        self
    }

    /// Build Timer.
    pub fn build(self) -> Result<Timer, TimerError> {
        if let Some(limit) = self.invalid_repeat {
            return Err(TimerError::InvalidRepeatLimit(limit));
        }

        #[cfg(feature = "status-report")]
        let (status_report_sender, status_reporter) = if self.enable_status_report {
            let (sender, receiver) = unbounded::<PublicEvent>();
            (Some(sender), Some(StatusReporter::new(receiver)))
        } else {
            (None, None)
        };

        let shared = TimerShared {
            delay: self.delay,
            repeat: self.repeat,
            callback_failure: self.callback_failure,
            run_ids: AtomicU64::new(0),
            state: Mutex::new(RunSlot::default()),
            #[cfg(feature = "status-report")]
            status_report_sender,
        };

        Ok(Timer {
            shared: Arc::new(shared),
            #[cfg(feature = "status-report")]
            status_reporter,
        })
    }
}

/// A repeatable interval timer.
///
/// Clones share the same state: stopping one clone stops the run that any
/// other clone started, which is how a callback can stop its own timer.
#[derive(Clone, Debug)]
pub struct Timer {
    shared: Arc<TimerShared>,
    #[cfg(feature = "status-report")]
    status_reporter: Option<StatusReporter>,
}

/// State shared by all clones of a `Timer` and, weakly, by its run task.
pub(crate) struct TimerShared {
    pub(crate) delay: Duration,
    pub(crate) repeat: Repeat,
    pub(crate) callback_failure: CallbackFailure,
    run_ids: AtomicU64,
    state: Mutex<RunSlot>,
    #[cfg(feature = "status-report")]
    status_report_sender: Option<AsyncSender<PublicEvent>>,
}

/// Bookkeeping of the current run, the only one a timer holds.
#[derive(Debug, Default)]
struct RunSlot {
    run_id: u64,
    motivation: Option<Arc<Motivation>>,
    repeat_count: u64,
    delivered: u64,
    sequence: Option<SequenceTeardown>,
    task: Option<RunTask>,
}

impl RunSlot {
    fn is_current(&self, run_id: u64) -> bool {
        self.run_id == run_id
            && self
                .motivation
                .as_ref()
                .map_or(false, |motivation| motivation.is_active())
    }
}

/// Result of handing a tick to one receiver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum HandedOff {
    Delivered,
    /// The receiver gave up waiting, the tick goes to the next one.
    ReceiverGone,
    /// The run was stopped, superseded or exhausted.
    RunOver,
}

impl Timer {
    /// New a Timer ticking every `delay` until stopped.
    pub fn new(delay: Duration) -> Timer {
        Timer::builder()
            .delay(delay)
            .build()
            .unwrap_or_else(|_| unreachable!("an infinite timer has nothing to validate"))
    }

    /// New a Timer whose runs stop after `limit` ticks.
    pub fn with_repeat(delay: Duration, limit: u64) -> Result<Timer, TimerError> {
        Timer::builder().delay(delay).repeat_times(limit).build()
    }

    /// Shorthand for `TimerBuilder::default()`.
    pub fn builder() -> TimerBuilder {
        TimerBuilder::default()
    }

    /// Start a run that invokes `callback` on every tick.
    ///
    /// The previous run is stopped first. The callback runs on the run task of
    /// `context`, this call returns immediately.
    pub fn start<F>(&self, context: &SchedulingContext, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        let callback: TickCallback = Box::new(callback);
        self.begin_run(context, || (Delivery::Callback(callback), None, ()));
    }

    /// Start a run that hands its ticks to the returned sequence.
    ///
    /// The previous run is stopped first, and its sequence reports
    /// end-of-sequence from then on. A tick is only handed over when a
    /// consumer is waiting for it, the run pauses until then.
    pub fn start_sequence(&self, context: &SchedulingContext) -> TickSequence {
        self.begin_run(context, || {
            let (hand_off, sequence, teardown) = rendezvous();
            (Delivery::HandOff(hand_off), Some(teardown), sequence)
        })
    }

    /// Stop the current run.
    ///
    /// No tick is started after this returns, a callback that is already
    /// executing finishes. The sequence of a sequence-mode run is closed
    /// for receive. Stopping a stopped timer does nothing.
    pub fn stop(&self) {
        let mut slot = self.shared.lock_slot();
        self.shared.finish_run(&mut slot, run::CANCELLED);
    }

    /// Whether a run is currently looping.
    pub fn is_active(&self) -> bool {
        self.shared
            .lock_slot()
            .motivation
            .as_ref()
            .map_or(false, |motivation| motivation.is_active())
    }

    /// Ticks counted toward the repeat limit in the current run.
    ///
    /// Always zero for `Repeat::Infinite`, and reset whenever a run ends.
    pub fn repeat_count(&self) -> u64 {
        self.shared.lock_slot().repeat_count
    }

    /// Time between two ticks.
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Repeat configuration of every run.
    pub fn repeat(&self) -> Repeat {
        self.shared.repeat
    }

    /// Wait until the task of the latest run has exited.
    ///
    /// Returns at once if there is no run task left to wait for. Stop the
    /// timer (or let it exhaust) first, an infinite run never exits on its
    /// own. Must not be awaited from the run's own callback.
    pub async fn join(&self) {
        let task = self.shared.lock_slot().task.take();

        if let Some(task) = task {
            task.join().await;
        }
    }

    // Both start modes go through here: supersede the old run, then spawn the new one.
    fn begin_run<B, T>(&self, context: &SchedulingContext, build_delivery: B) -> T
    where
        B: FnOnce() -> (Delivery, Option<SequenceTeardown>, T),
    {
        let mut slot = self.shared.lock_slot();
        self.shared.finish_run(&mut slot, run::CANCELLED);

        if let Some(task) = slot.task.take() {
            task.detach();
        }

        let run_id = self.shared.run_ids.fetch_add(1, Ordering::Relaxed) + 1;
        let (delivery, sequence, handle) = build_delivery();
        let motivation = Motivation::new();

        slot.run_id = run_id;
        slot.motivation = Some(motivation.clone());
        slot.repeat_count = 0;
        slot.delivered = 0;
        slot.sequence = sequence;

        let routine = RunRoutine {
            run_id,
            delay: self.shared.delay,
            motivation,
            delivery,
            timer: Arc::downgrade(&self.shared),
        };

        info!(
            "timer run {} starting on {:?}, delay {:?}, repeat {:?}",
            run_id,
            context.kind(),
            self.shared.delay,
            self.shared.repeat
        );

        let span = info_span!("timer_run", run_id);
        slot.task = Some(context.spawn(routine.run().instrument(span)));

        #[cfg(feature = "status-report")]
        self.shared.report(PublicEvent::RunStarted(run_id));

        handle
    }
}

cfg_status_report!(
    impl TimerBuilder {
        /// Whether to expose public events.
        pub fn enable_status_report(mut self) -> Self {
            self.enable_status_report = true;
            self
        }
    }

    impl Timer {
        /// Take StatusReporter from Timer, through which you can get public events.
        pub fn take_status_reporter(&mut self) -> Option<StatusReporter> {
            self.status_reporter.take()
        }
    }

    impl TimerShared {
        pub(crate) fn report(&self, event: PublicEvent) {
            if let Some(sender) = self.status_report_sender.as_ref() {
                if sender.try_send(event).is_err() {
                    trace!("status report dropped: {:?}", event);
                }
            }
        }
    }
);

impl TimerShared {
    fn lock_slot(&self) -> MutexGuard<'_, RunSlot> {
        // The slot is only mutated by short, non-panicking sections.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_run(&self, slot: &mut RunSlot, outcome: RunState) {
        if let Some(motivation) = slot.motivation.as_ref() {
            if motivation.finish(outcome) {
                debug!("timer run {} finished with state {}", slot.run_id, outcome);

                #[cfg(feature = "status-report")]
                self.report(PublicEvent::RunFinished(slot.run_id));
            }
        }

        if let Some(sequence) = slot.sequence.as_ref() {
            if !sequence.is_closed_for_receive() {
                sequence.teardown();
            }
        }

        slot.repeat_count = 0;
    }

    /// Finish `run_id` if it is still the current run, a superseded run
    /// must not touch its successor.
    pub(crate) fn finish_run_if_current(&self, run_id: u64, outcome: RunState) {
        let mut slot = self.lock_slot();

        if slot.run_id == run_id {
            self.finish_run(&mut slot, outcome);
        }
    }

    /// Repeat-constraint evaluation after a callback-mode tick.
    pub(crate) fn tick_delivered(&self, run_id: u64) {
        let mut slot = self.lock_slot();

        if slot.is_current(run_id) {
            self.count_tick(&mut slot);
        }
    }

    /// Hand one tick of `run_id` to a waiting receiver.
    ///
    /// Runs under the slot lock, so a `stop` that returned first leaves the
    /// ticket unanswered. The last tick of a limited run finishes the run and
    /// closes the sequence before the receiver can observe it.
    pub(crate) fn hand_off_tick(&self, run_id: u64, ticket: Ticket) -> HandedOff {
        let mut slot = self.lock_slot();

        if !slot.is_current(run_id) {
            return HandedOff::RunOver;
        }

        if ticket.is_abandoned() {
            return HandedOff::ReceiverGone;
        }

        self.count_tick(&mut slot);

        if !ticket.deliver() {
            debug!("run {} lost a tick to a receiver that went away", run_id);
        }

        HandedOff::Delivered
    }

    fn count_tick(&self, slot: &mut RunSlot) {
        slot.delivered += 1;

        #[cfg(feature = "status-report")]
        self.report(PublicEvent::Tick(slot.run_id, slot.delivered));

        let limit = match self.repeat {
            Repeat::Infinite => return,
            Repeat::Times(limit) => limit.get(),
        };

        slot.repeat_count += 1;
        trace!("run {} tick {}/{}", slot.run_id, slot.repeat_count, limit);

        if slot.repeat_count == limit {
            self.finish_run(slot, run::COMPLETED);
        }
    }

    /// The run task of `run_id` is leaving its loop.
    pub(crate) fn run_exited(&self, run_id: u64) {
        // A hand-off that failed because its sequence went away still has to
        // leave the timer inactive.
        self.finish_run_if_current(run_id, run::CANCELLED);
    }
}

impl fmt::Debug for TimerShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerShared")
            .field("delay", &self.delay)
            .field("repeat", &self.repeat)
            .field("callback_failure", &self.callback_failure)
            .field("run_ids", &self.run_ids)
            .finish()
    }
}

impl Drop for TimerShared {
    fn drop(&mut self) {
        let slot = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(motivation) = slot.motivation.as_ref() {
            motivation.finish(run::CANCELLED);
        }

        if let Some(sequence) = slot.sequence.as_ref() {
            sequence.teardown();
        }

        if let Some(task) = slot.task.take() {
            task.detach();
        }
    }
}
