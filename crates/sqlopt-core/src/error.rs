use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Planning error: {0}")]
    Plan(String),

    #[error("field missing: {table}.{name} is not present in the target schema")]
    FieldMissing { table: String, name: String },

    // Raised while evaluating an expression; constant folding swallows these.
    #[error("Evaluation error: {0}")]
    Eval(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}
