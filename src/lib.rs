//! Debounced async queries: collapse bursts of input into one operation and
//! keep only the newest result.

pub mod app;
pub mod error;
pub mod logging;
pub mod model;
pub mod services;

pub use error::{AppError, AppResult, ConfigError, ErrorKind, OperationError};
pub use model::generation::Generation;
pub use model::query::Query;
pub use model::result::{OperationResult, Snapshot, Status};
pub use model::store::{ResultStore, StoreSubscription};
pub use services::controller::{DebounceConfig, DebounceController};
pub use services::operation::{Operation, OperationFuture};
pub use services::runner::{OperationRunner, RunOutcome};
