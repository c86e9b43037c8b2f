//! The pull-style tick surface.
//!
//! # TickSequence
//!
//! A rendezvous queue with zero capacity: every receiver that waits for a tick
//! parks a one-shot ticket in the queue, and the run hands a tick over by
//! answering one ticket. Nothing is ever buffered, so a consumer that walked
//! away can not make the producer block on it, and a torn down sequence has
//! nothing left to drain.
//!
//! The capabilities are split three ways:
//!
//! 1. `TickSequence`, held by callers, may receive and ask whether the sequence is closed.
//! 2. `HandOff`, held by the run task, waits for tickets that the timer then answers.
//! 3. `SequenceTeardown`, held by the owning `Timer`, is the only way to close it.

use crate::prelude::*;

use futures::channel::oneshot;
use futures::ready;
use futures::stream::{FusedStream, Stream};
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

/// One tick handed out by a sequence-mode run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tick;

/// A receiver waiting for exactly one tick.
#[derive(Debug)]
pub(crate) struct Ticket(oneshot::Sender<Tick>);

impl Ticket {
    /// The receiver stopped waiting, its tick belongs to the next one.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.0.is_canceled()
    }

    /// Returns false if the receiver went away in the meantime.
    pub(crate) fn deliver(self) -> bool {
        self.0.send(Tick).is_ok()
    }
}

#[derive(Debug, Default)]
struct TicketQueue {
    cancelled: bool,
    tickets: VecDeque<oneshot::Sender<Tick>>,
}

enum Popped {
    Ticket(Ticket),
    Empty,
    Cancelled,
}

struct SequenceCore {
    closed_for_receive: AtomicBool,
    queue: Mutex<TicketQueue>,
    ticket_posted: Event,
}

impl SequenceCore {
    fn is_closed_for_receive(&self) -> bool {
        self.closed_for_receive.load(Ordering::Acquire)
    }

    fn lock_queue(&self) -> MutexGuard<'_, TicketQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park a ticket for the producer, `None` once the queue is cancelled.
    ///
    /// Tickets of receivers that gave up are swept out on the way, so the
    /// queue never holds more than the receivers still waiting.
    fn post_ticket(&self) -> Option<oneshot::Receiver<Tick>> {
        if self.is_closed_for_receive() {
            return None;
        }

        let (ticket, reply) = oneshot::channel();
        {
            let mut queue = self.lock_queue();
            if queue.cancelled {
                return None;
            }

            queue.tickets.retain(|parked| !parked.is_canceled());
            queue.tickets.push_back(ticket);
        }

        self.ticket_posted.notify(1);
        Some(reply)
    }

    fn pop_ticket(&self) -> Popped {
        let mut queue = self.lock_queue();
        if queue.cancelled {
            return Popped::Cancelled;
        }

        while let Some(ticket) = queue.tickets.pop_front() {
            if ticket.is_canceled() {
                trace!("skipping an abandoned tick receiver");
                continue;
            }

            return Popped::Ticket(Ticket(ticket));
        }

        Popped::Empty
    }
}

impl fmt::Debug for SequenceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceCore")
            .field("closed_for_receive", &self.is_closed_for_receive())
            .field("parked_tickets", &self.lock_queue().tickets.len())
            .finish()
    }
}

/// Build the three capabilities of one fresh rendezvous queue.
pub(crate) fn rendezvous() -> (HandOff, TickSequence, SequenceTeardown) {
    let core = Arc::new(SequenceCore {
        closed_for_receive: AtomicBool::new(false),
        queue: Mutex::new(TicketQueue::default()),
        ticket_posted: Event::new(),
    });

    (
        HandOff { core: core.clone() },
        TickSequence::new(core.clone()),
        SequenceTeardown { core },
    )
}

async fn receive(core: Arc<SequenceCore>) -> Option<Tick> {
    let reply = core.post_ticket()?;

    // A dropped ticket means the sequence was torn down while we waited.
    reply.await.ok()
}

/// The consumer side of a sequence-mode run.
///
/// Receive with [`TickSequence::recv`] or iterate it as a `Stream`. The
/// sequence ends when its run is stopped, restarted or exhausted, and it can
/// not be restarted itself: call `Timer::start_sequence` again for a new one.
///
/// Clones share the same queue, each tick is handed to exactly one receiver.
/// Receiving is cancel safe: a receive dropped before its tick arrived
/// consumes nothing.
pub struct TickSequence {
    core: Arc<SequenceCore>,
    pending: Option<oneshot::Receiver<Tick>>,
}

impl TickSequence {
    fn new(core: Arc<SequenceCore>) -> Self {
        TickSequence {
            core,
            pending: None,
        }
    }

    /// Wait for the next tick, `None` is the end of the sequence.
    ///
    /// The returned future does not borrow the sequence and may be moved to
    /// another task.
    pub fn recv(&self) -> impl Future<Output = Option<Tick>> + Send + 'static {
        receive(self.core.clone())
    }

    /// Whether the owning run has torn this sequence down.
    ///
    /// Once true, every receive returns `None` immediately.
    pub fn is_closed_for_receive(&self) -> bool {
        self.core.is_closed_for_receive()
    }

    /// Cancellation from outside is refused while the sequence is open.
    ///
    /// Stop the owning timer with `Timer::stop()` instead, after that this
    /// call is a no-op.
    pub fn cancel(&self) -> Result<(), TimerError> {
        if self.is_closed_for_receive() {
            return Ok(());
        }

        Err(TimerError::IllegalOperation)
    }
}

impl Clone for TickSequence {
    fn clone(&self) -> Self {
        TickSequence::new(self.core.clone())
    }
}

impl fmt::Debug for TickSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickSequence")
            .field("closed_for_receive", &self.is_closed_for_receive())
            .field("receiving", &self.pending.is_some())
            .finish()
    }
}

impl Stream for TickSequence {
    type Item = Tick;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Tick>> {
        let this = &mut *self;

        if this.pending.is_none() {
            this.pending = this.core.post_ticket();
        }

        let reply = match this.pending.as_mut() {
            Some(reply) => reply,
            None => return Poll::Ready(None),
        };

        let tick = ready!(reply.poll_unpin(cx)).ok();
        this.pending = None;

        Poll::Ready(tick)
    }
}

impl FusedStream for TickSequence {
    fn is_terminated(&self) -> bool {
        self.pending.is_none() && self.is_closed_for_receive()
    }
}

/// The producer side of a sequence-mode run.
#[derive(Debug)]
pub(crate) struct HandOff {
    core: Arc<SequenceCore>,
}

impl HandOff {
    /// Wait for a receiver that is ready for a tick.
    ///
    /// Returns `None` if the run stopped or the sequence was torn down first,
    /// which is a normal end of the run. The tick itself is handed over by
    /// the owning timer through [`Ticket::deliver`].
    pub(crate) async fn next_ticket(&self, motivation: &Motivation) -> Option<Ticket> {
        loop {
            // Listen before looking, a ticket posted in between still wakes us.
            let posted = self.core.ticket_posted.listen();

            match self.core.pop_ticket() {
                Popped::Ticket(ticket) => return Some(ticket),
                Popped::Cancelled => return None,
                Popped::Empty => {}
            }

            let cancelled = motivation.cancelled();
            futures::pin_mut!(posted, cancelled);

            if let Either::Right(_) = select(posted, cancelled).await {
                return None;
            }
        }
    }
}

/// Teardown capability of a sequence, kept privately by the owning `Timer`.
#[derive(Debug)]
pub(crate) struct SequenceTeardown {
    core: Arc<SequenceCore>,
}

impl SequenceTeardown {
    /// Cancel the queue, drop every waiting receiver, then mark the sequence
    /// closed for receive. Calling it again is a no-op.
    pub(crate) fn teardown(&self) {
        let dropped = {
            let mut queue = self.core.lock_queue();
            queue.cancelled = true;
            queue.tickets.drain(..).count()
        };

        self.core.ticket_posted.notify(usize::MAX);

        if dropped > 0 {
            debug!("tick sequence torn down with {} waiting receivers", dropped);
        }

        self.core.closed_for_receive.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed_for_receive(&self) -> bool {
        self.core.is_closed_for_receive()
    }
}
