use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy of the engine.
///
/// Absent targets are intentionally not represented here: a delete or stock
/// adjustment that matches nothing reports a "nothing matched" flag
/// (`OpOutcome::Deleted { removed: false }`, `Ok(None)`) instead of failing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// An insert collided with an existing document id.
    #[error("duplicate key: a document with id '{0}' already exists")]
    DuplicateKey(String),

    /// A stock adjustment would drive `in_stock` below zero. The document
    /// is left unmodified.
    #[error("insufficient stock on '{id}': available {available}, requested delta {delta}")]
    InsufficientStock {
        id: String,
        available: i64,
        delta: i64,
    },

    /// A pipeline stage is malformed. Raised during validation, before any
    /// stage executes.
    #[error("invalid pipeline stage: {0}")]
    InvalidStage(String),

    /// A typed model could not be converted to or from its document form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Surfaced unchanged from the store collaborator.
    #[error("store connection error: {0}")]
    Connection(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
