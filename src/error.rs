use thiserror::Error;

/// Failure reported by an annotation provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    #[error("annotation provider unavailable: {0}")]
    Unavailable(String),

    #[error("annotation failed: {0}")]
    Failed(String),
}

/// Failure reported by an external task analyzer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("analyzer unavailable")]
    Unavailable,

    #[error("analyzer rejected the request: {0}")]
    Rejected(String),

    #[error("analyzer returned a malformed response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid timestamp '{0}', expected ISO 8601 (e.g. 2024-01-10T09:00:00)")]
    InvalidTimestamp(String),

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
