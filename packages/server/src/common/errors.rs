use thiserror::Error;

/// Error taxonomy for the draft review workflow.
///
/// `Validation` and `AdminRequired` are rejected before any mutation.
/// `Conflict` means the draft's state changed since the caller last read it
/// (another reviewer already acted, or a resubmission raced); callers must
/// refetch before retrying - retries are never automatic. `Apply` aborts the
/// whole atomic operation, leaving the draft SUBMITTED and the ledger
/// untouched.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("admin access required")]
    AdminRequired,

    #[error("cannot apply draft payload: {0}")]
    Apply(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ReviewError {
    fn from(err: sqlx::Error) -> Self {
        // A unique violation on the pending-draft or version index is a lost
        // race, not an infrastructure fault.
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return ReviewError::Conflict(
                    "a concurrent operation already claimed this draft slot".to_string(),
                );
            }
        }
        ReviewError::Storage(err.into())
    }
}
