//! Application Layer - Use cases wiring domain logic to ports
//!
//! - `executor`: bounded retry with per-attempt timeout
//! - `evaluator`: per-token verdicts
//! - `dispatcher`: trade intents and operator notifications
//! - `pipeline`: polling cycles and manual evaluation

pub mod executor;
pub mod evaluator;
pub mod dispatcher;
pub mod pipeline;

pub use executor::{
    ExecutionFailure, ExecutionObserver, ResilientExecutor, RetryPolicy, TracingObserver,
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use evaluator::{Evaluation, SafetyFailurePolicy, TokenEvaluator};
pub use dispatcher::{ActionDispatcher, ActionOutcome, DispatchError};
pub use pipeline::{Pipeline, PipelineConfig};
