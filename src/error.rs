use std::any::Any;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failures surfaced to the calling process as an [`ErrorReport`].
#[derive(Error, Debug)]
pub enum TranscribeError {
    /// The external media decoder is not on the search path.
    #[error(
        "{program} not found in PATH. Please install {program} and ensure it's accessible \
         (e.g. `apt install ffmpeg`, `brew install ffmpeg` or https://ffmpeg.org/download.html)"
    )]
    DependencyMissing { program: String },

    #[error("Video file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Model resolution, model load, audio decoding or inference failed.
    #[error("{0}")]
    EngineFailure(Box<dyn std::error::Error>),

    #[error("failed to write {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranscribeError {
    pub fn engine(message: impl Into<Box<dyn std::error::Error>>) -> Self {
        Self::EngineFailure(message.into())
    }

    /// Category name carried in [`ErrorReport::kind`].
    pub fn category(&self) -> &'static str {
        match self {
            TranscribeError::DependencyMissing { .. } => "DependencyMissing",
            TranscribeError::FileNotFound { .. } => "FileNotFound",
            TranscribeError::EngineFailure(_) => "EngineFailure",
            TranscribeError::IoFailure { .. } => "IOFailure",
        }
    }
}

/// The JSON document written on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ErrorReport {
    pub fn new(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
        }
    }

    /// Report for a panic payload caught while running a request.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unexpected panic".to_string());
        Self::new(message, "Panic")
    }
}

impl From<&TranscribeError> for ErrorReport {
    fn from(error: &TranscribeError) -> Self {
        Self::new(error.to_string(), error.category())
    }
}
