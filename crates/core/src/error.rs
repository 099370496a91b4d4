#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No current version: load an image first")]
    NoCurrentVersion,

    #[error("Index {index} is out of range ({len} available)")]
    OutOfRange { index: usize, len: usize },

    #[error("Got {codes} artifact codes but {previews} previews")]
    LengthMismatch { codes: usize, previews: usize },

    #[error("History changed while the edit was in flight (generation {expected} -> {actual})")]
    StaleGeneration { expected: u64, actual: u64 },
}
