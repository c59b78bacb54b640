use thiserror::Error;

/// Every failure the engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid boundaries x:[{lower_x}..{upper_x}) y:[{lower_y}..{upper_y}): extents must be non-negative and ordered")]
    NegativeExtent {
        lower_x: i64,
        upper_x: i64,
        lower_y: i64,
        upper_y: i64,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A thread gave up waiting on a cell guard or a full event queue.
    #[error("thread `{thread}` starved waiting for {resource}")]
    Starvation { thread: String, resource: String },

    /// A sibling worker died while others were waiting on the frame barrier.
    #[error("frame barrier broken: a sibling worker died mid-frame")]
    BarrierBroken,

    #[error("cell ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds { x: i64, y: i64, size: u32 },

    #[error("`{thread}` cannot mutate cell ({x}, {y}): owned by worker {owner}")]
    NotOwner { thread: String, x: u32, y: u32, owner: usize },

    #[error("worker {0} is no longer accepting events")]
    WorkerGone(usize),

    #[error("worker thread `{0}` panicked")]
    WorkerPanicked(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    #[error("task `{task}` failed: {reason}")]
    Task { task: String, reason: String },
}

impl SimError {
    /// Starvation error naming the calling thread.
    pub fn starvation(resource: impl Into<String>) -> Self {
        let thread = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        SimError::Starvation { thread, resource: resource.into() }
    }

    /// Errors after which a worker cannot keep participating in frames.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::BarrierBroken | SimError::WorkerPanicked(_))
    }
}
