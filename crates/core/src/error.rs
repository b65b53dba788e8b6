#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing target configuration: {}", .0.join(", "))]
    MissingTarget(Vec<&'static str>),

    #[error("Validation failed: {0}")]
    Validation(String),
}
