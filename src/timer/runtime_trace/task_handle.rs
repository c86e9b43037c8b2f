// RunTask is the join handle of a spawned run.
// Runs stop cooperatively through their `Motivation`, the handle is only kept
// so that a caller can wait for the task to be gone.

use crate::prelude::*;

use smol::Task as SmolTask;
use tokio::task::JoinHandle as TokioJoinHandle;

/// Join handle of a run task, for whichever runtime spawned it.
#[derive(Debug)]
pub(crate) enum RunTask {
    Tokio(TokioJoinHandle<()>),
    Smol(SmolTask<()>),
}

impl RunTask {
    /// Let the task finish on its own.
    ///
    /// A dropped smol task is cancelled at its next suspension, so it is
    /// detached explicitly, tokio handles detach on drop.
    pub(crate) fn detach(self) {
        match self {
            RunTask::Tokio(_) => {}
            RunTask::Smol(task) => task.detach(),
        }
    }

    /// Wait until the run task exits.
    pub(crate) async fn join(self) {
        match self {
            RunTask::Tokio(handle) => {
                if let Err(e) = handle.await {
                    error!("timer run task did not finish cleanly: {}", e);
                }
            }
            RunTask::Smol(task) => task.await,
        }
    }
}

impl From<TokioJoinHandle<()>> for RunTask {
    fn from(handle: TokioJoinHandle<()>) -> Self {
        RunTask::Tokio(handle)
    }
}

impl From<SmolTask<()>> for RunTask {
    fn from(task: SmolTask<()>) -> Self {
        RunTask::Smol(task)
    }
}
