/*!
 * Concurrent dispatch of cell translations.
 *
 * A batch expands every (row, target language) pair into an independent task
 * and runs those tasks under a concurrency cap and a minimum request spacing:
 *
 * - `rate_limiter`: Minimum spacing between outgoing calls
 * - `job`: Batch descriptor and per-cell task descriptors
 * - `results`: Per-cell outcomes and the shared result store
 * - `progress`: Completion counter and progress sinks
 * - `runner`: Execution of a single task with failure isolation
 * - `engine`: Fan-out, cancellation and the terminal signal
 */

// Re-export main types for easier usage
pub use self::engine::{
    BatchIo, BatchReport, CancellationFlag, DispatchEngine, DispatchSummary, EngineOptions,
    EngineState,
};
pub use self::job::{CellKey, SourceRow, TaskDescriptor, TranslationJob};
pub use self::progress::{
    ChannelProgressSink, LogProgressSink, ProgressEvent, ProgressSink, ProgressTracker,
};
pub use self::rate_limiter::RateLimiter;
pub use self::results::{ResultStore, TaskOutcome};
pub use self::runner::TaskRunner;

// Submodules
pub mod engine;
pub mod job;
pub mod progress;
pub mod rate_limiter;
pub mod results;
pub mod runner;
