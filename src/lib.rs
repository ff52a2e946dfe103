pub mod audio;
pub mod capture;
pub mod decoder;
pub mod engines;
pub mod error;
pub mod models;
pub mod output;
pub mod preflight;
pub mod request;
pub mod transcriber;

use std::path::Path;

use serde::Serialize;

pub use error::{ErrorReport, TranscribeError};
pub use request::{ModelTier, TaskMode, TranscriptionRequest};

/// Language reported when neither the caller nor the engine supplies one.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// The JSON document written on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
    /// Audio duration in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Segment start time in seconds.
    pub start: f64,
    /// Segment end time in seconds.
    pub end: f64,
    pub text: String,
}

/// Raw record produced by an engine, before it is reshaped into a
/// [`TranscriptionResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    pub language: Option<String>,
    pub segments: Vec<EngineSegment>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceParams {
    pub task: TaskMode,
    /// `None` lets the engine detect the spoken language.
    pub language: Option<String>,
    pub n_threads: Option<usize>,
}

pub trait TranscriptionEngine {
    type ModelParams: Default;

    /// Load with default model params.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load with explicit model params.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Transcribe already-decoded samples (16 kHz, mono, f32 in [-1, 1]).
    fn transcribe_samples(
        &mut self,
        samples: Vec<f32>,
        params: &InferenceParams,
    ) -> Result<EngineOutput, Box<dyn std::error::Error>>;
}
