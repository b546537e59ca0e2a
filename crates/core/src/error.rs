#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient pose data: {found} valid frames, at least {required} required")]
    InsufficientData { found: usize, required: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}
