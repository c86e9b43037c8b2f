/// State of a timer run.
pub mod run {
    /// Set if the run is still looping.
    pub const RUNNING: usize = 1 << 1;

    /// Set if the run used up its repeat limit.
    pub const COMPLETED: usize = 1 << 2;

    /// Set if the run has been stopped or superseded by a restart.
    pub const CANCELLED: usize = 1 << 3;
}
