use thiserror::Error;

/// Result type local to sqlopt-planner.
pub type Result<T> = std::result::Result<T, OptimizeError>;

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// A rule failed; the pipeline stops and the plan is not used.
    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: &'static str,
        #[source]
        source: sqlopt_core::Error,
    },

    #[error("invalid optimizer configuration: {0}")]
    Config(String),

    #[error("cannot parse optimizer configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("cannot parse optimizer configuration: {0}")]
    Json(#[from] serde_json::Error),
}
