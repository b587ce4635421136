//! Engine error types.

use thiserror::Error;

use rota_ledger::{PersonId, UnitId};

/// Errors that can occur during scheduling operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("person not found: {0}")]
    PersonNotFound(PersonId),

    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A guarded commit kept losing its race; the operation was retried
    /// `{0}` times without ever seeing a stable snapshot.
    #[error("commit contention persisted after {0} attempts")]
    Contention(u32),

    #[error("ledger error: {0}")]
    Ledger(#[from] rota_ledger::LedgerError),
}

pub type EngineResult<T> = Result<T, EngineError>;
