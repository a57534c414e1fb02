#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// A raw layer tuple that cannot become a `Layer`.
    MalformedLayer { index: usize, reason: String },
    /// A raw record that cannot become a `WellRecord`.
    MalformedRecord(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::MalformedLayer { index, reason } => {
                write!(f, "malformed layer tuple #{index}: {reason}")
            }
            IngestError::MalformedRecord(msg) => write!(f, "malformed well record: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Failure of a whole terrain sampling batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainError {
    pub message: String,
}

impl TerrainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TerrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "terrain sampling failed: {}", self.message)
    }
}

impl std::error::Error for TerrainError {}
