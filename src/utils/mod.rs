//! utils holds the optional side channels of a timer.
pub mod status_report;

pub use status_report::{PublicEvent, StatusReporter};
