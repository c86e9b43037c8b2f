use crate::prelude::*;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The lifetime handle of one timer run.
///
/// A run keeps looping while its motivation is `RUNNING`. Finishing it is a
/// one-way transition and wakes every task suspended in [`Motivation::cancelled`].
pub(crate) struct Motivation {
    state: AtomicUsize,
    /// The event view of state transitions.
    event: Event,
}

impl Motivation {
    pub(crate) fn new() -> Arc<Motivation> {
        Arc::new(Motivation {
            state: AtomicUsize::new(run::RUNNING),
            event: Event::new(),
        })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state() == run::RUNNING
    }

    pub(crate) fn state(&self) -> RunState {
        self.state.load(Ordering::Acquire)
    }

    /// Move a running motivation into `outcome`.
    ///
    /// Returns false if it was already finished, the first outcome wins.
    pub(crate) fn finish(&self, outcome: RunState) -> bool {
        let finished = self
            .state
            .compare_exchange(run::RUNNING, outcome, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if finished {
            self.event.notify(usize::MAX);
        }

        finished
    }

    /// Resolves once the motivation is no longer running.
    pub(crate) async fn cancelled(&self) {
        loop {
            if !self.is_active() {
                return;
            }

            // Register before the second check, a `finish` in between still wakes us.
            let listener = self.event.listen();

            if !self.is_active() {
                return;
            }

            listener.await;
        }
    }
}

impl fmt::Debug for Motivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motivation")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_finish_once() {
        let motivation = Motivation::new();
        assert!(motivation.is_active());

        assert!(motivation.finish(run::COMPLETED));
        assert!(!motivation.finish(run::CANCELLED));

        assert_eq!(motivation.state(), run::COMPLETED);
        assert!(!motivation.is_active());
    }

    #[test]
    fn test_cancelled_wakes_waiter() {
        let motivation = Motivation::new();
        let finisher = motivation.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            finisher.finish(run::CANCELLED);
        });

        smol::block_on(motivation.cancelled());
        assert_eq!(motivation.state(), run::CANCELLED);

        handle.join().unwrap();
    }

    #[test]
    fn test_cancelled_after_finish_is_immediate() {
        let motivation = Motivation::new();
        motivation.finish(run::CANCELLED);

        smol::block_on(motivation.cancelled());
    }
}
