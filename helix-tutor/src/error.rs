use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelixTutorError {
    #[error("Could not normalize {source_name}: {reason}")]
    Normalization { source_name: String, reason: String },

    #[error("Indexing failed: {0}")]
    Indexing(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Index snapshot is corrupt: {0}")]
    CorruptSnapshot(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Binary encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HelixTutorError {
    pub fn normalization(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Normalization {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::Config(_) => 3,
            Self::Indexing(_) | Self::Embedding(_) | Self::CorruptSnapshot(_) => 4,
            Self::Generation(_) | Self::Http(_) => 5,
            Self::Normalization { .. } | Self::Retrieval(_) | Self::Tool { .. } => 6,
            Self::Io(_) | Self::Serialization(_) | Self::Encoding(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, HelixTutorError>;
