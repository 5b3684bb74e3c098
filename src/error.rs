use thiserror::Error;

/// Failure of a calorie lookup.
///
/// `NotFound` is a data answer from the nutrition service and belongs to the
/// dish-name field. The remaining kinds are transient and are shown as a
/// generic retry message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{message}")]
    NotFound { message: String },
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("lookup timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("session rejected by nutrition service (status {status})")]
    Unauthorized { status: u16 },
}

impl LookupError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True when retrying the same input may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

/// Invariant violations rejected by `MealStore::add`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("servings must be positive, got {0}")]
    InvalidServings(f64),
    #[error("calories per serving must be non-negative, got {0}")]
    InvalidCalories(f64),
    #[error("total calories {total} does not match {servings} x {calories_per_serving}")]
    InconsistentTotal {
        total: f64,
        servings: f64,
        calories_per_serving: f64,
    },
    #[error("dish name must not be empty")]
    EmptyDishName,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slot io ({slot}): {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },
    #[error("slot encoding ({slot}): {source}")]
    Encoding {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Network(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("a calorie lookup is already in progress")]
    Busy,
    #[error("a looked-up meal is waiting for confirmation")]
    AwaitingConfirmation,
    #[error("no meal is waiting for confirmation")]
    NothingPending,
    #[error("failed to commit meal: {0}")]
    Commit(#[from] StoreError),
}
