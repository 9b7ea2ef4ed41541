use crate::error::OperationError;
use crate::model::generation::Generation;
use crate::model::query::Query;

/// Lifecycle of one operation as seen by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult<P> {
    Idle,
    Pending,
    Success(P),
    Failure(OperationError),
}

impl<P> OperationResult<P> {
    pub fn status(&self) -> Status {
        match self {
            OperationResult::Idle => Status::Idle,
            OperationResult::Pending => Status::Pending,
            OperationResult::Success(_) => Status::Success,
            OperationResult::Failure(_) => Status::Failure,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationResult::Success(_) | OperationResult::Failure(_))
    }
}

impl<P> From<Result<P, OperationError>> for OperationResult<P> {
    fn from(result: Result<P, OperationError>) -> Self {
        match result {
            Ok(payload) => OperationResult::Success(payload),
            Err(err) => OperationResult::Failure(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Idle,
    Pending,
    Success,
    Failure,
}

/// Immutable view of the store. `version` grows on every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<P> {
    pub query: Option<Query>,
    pub generation: Generation,
    pub result: OperationResult<P>,
    pub version: u64,
}

impl<P> Snapshot<P> {
    pub fn idle() -> Self {
        Self {
            query: None,
            generation: Generation::ZERO,
            result: OperationResult::Idle,
            version: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.result.status()
    }

    pub fn payload(&self) -> Option<&P> {
        match &self.result {
            OperationResult::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&OperationError> {
        match &self.result {
            OperationResult::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == Status::Pending
    }
}

impl<P> Default for Snapshot<P> {
    fn default() -> Self {
        Self::idle()
    }
}
