//! kind of contanier for trace a timer run.
//!
//! # Motivation
//!
//! the lifetime handle of a run, the run keeps looping while it is `RUNNING`:
//!
//! 1. `stop` or a restart moves it to `CANCELLED`.
//! 2. Reaching the repeat limit moves it to `COMPLETED`.
//! 3. Both transitions wake the run task out of its delay or hand-off.
//!
//! # RunTask
//!
//! the join handle of the spawned run task, for tokio or smol.
pub(crate) mod lifetime;
pub mod state;
pub(crate) mod task_handle;
