// status_report is mod for report the life of timer runs.
// if open feature status-report, then compile that mod .
use crate::prelude::*;

use smol::channel::TryRecvError;

/// Receiving end of the public events of one `Timer`.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    inner: AsyncReceiver<PublicEvent>,
}

impl StatusReporter {
    /// Take the next public event without waiting, `None` if there is none yet.
    pub fn next_public_event(&self) -> Option<PublicEvent> {
        match self.inner.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    /// Wait for the next public event, `None` once the timer is gone.
    pub async fn next_public_event_with_async_wait(&self) -> Option<PublicEvent> {
        self.inner.recv().await.ok()
    }

    pub(crate) fn new(inner: AsyncReceiver<PublicEvent>) -> Self {
        Self { inner }
    }
}

/// Public events of a timer, carrying the run id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PublicEvent {
    /// A run was spawned.
    RunStarted(u64),
    /// A run delivered its n-th tick, counted from 1.
    Tick(u64, u64),
    /// A run was stopped, superseded or exhausted.
    RunFinished(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_next_public_event() {
        let (sender, receiver) = unbounded();
        let reporter = StatusReporter::new(receiver);

        assert_eq!(reporter.next_public_event(), None);

        sender.try_send(PublicEvent::RunStarted(1)).unwrap();
        sender.try_send(PublicEvent::Tick(1, 1)).unwrap();

        assert_eq!(reporter.next_public_event(), Some(PublicEvent::RunStarted(1)));
        assert_eq!(
            smol::block_on(reporter.next_public_event_with_async_wait()),
            Some(PublicEvent::Tick(1, 1))
        );

        drop(sender);
        assert_eq!(smol::block_on(reporter.next_public_event_with_async_wait()), None);
    }
}
