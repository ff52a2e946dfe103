use log::{debug, info};

use crate::capture::with_captured_stdout;
use crate::decoder::AudioExtractor;
use crate::error::TranscribeError;
use crate::models::ModelStore;
use crate::preflight::Preflight;
use crate::request::TranscriptionRequest;
use crate::{
    EngineOutput, InferenceParams, Segment, TranscriptionEngine, TranscriptionResult,
    UNKNOWN_LANGUAGE,
};

/// Runs one request through preflight, model load, inference and reshaping.
pub struct Transcriber<E> {
    engine: E,
    preflight: Preflight,
    models: ModelStore,
    n_threads: Option<usize>,
}

impl<E: TranscriptionEngine> Transcriber<E> {
    pub fn new(engine: E, preflight: Preflight, models: ModelStore) -> Self {
        Self {
            engine,
            preflight,
            models,
            n_threads: None,
        }
    }

    pub fn with_threads(mut self, n_threads: Option<usize>) -> Self {
        self.n_threads = n_threads;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn run(
        &mut self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, TranscribeError> {
        // Both checks happen before the model is touched.
        let decoder = self.preflight.run(&request.video_path)?;

        info!("Loading model: {}", request.model_tier);
        let model_path = self
            .models
            .resolve(request.model_tier)
            .map_err(TranscribeError::engine)?;
        self.engine
            .load_model(&model_path)
            .map_err(TranscribeError::EngineFailure)?;

        info!(
            "{} video: {}",
            request.task.action(),
            request.video_path.display()
        );
        let samples = AudioExtractor::new(decoder)
            .extract(&request.video_path)
            .map_err(TranscribeError::engine)?;

        let params = InferenceParams {
            task: request.task,
            language: request.language_hint.clone(),
            n_threads: self.n_threads,
        };

        let engine = &mut self.engine;
        let (output, captured) =
            with_captured_stdout(|| engine.transcribe_samples(samples, &params)).map_err(
                |source| TranscribeError::IoFailure {
                    path: "<stdout>".into(),
                    source,
                },
            )?;
        for line in captured.lines().filter(|line| !line.trim().is_empty()) {
            debug!("engine: {line}");
        }

        let output = output.map_err(TranscribeError::EngineFailure)?;
        Ok(reshape(output))
    }
}

/// Shape an engine's raw record into the output document.
pub fn reshape(output: EngineOutput) -> TranscriptionResult {
    let segments = output
        .segments
        .into_iter()
        .map(|segment| Segment {
            start: segment.start,
            end: segment.end,
            text: segment.text.trim().to_string(),
        })
        .collect();

    TranscriptionResult {
        text: output.text,
        language: output
            .language
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        segments,
        duration: output.duration.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineSegment;

    fn engine_output() -> EngineOutput {
        EngineOutput {
            text: " Hello there. General Kenobi.".to_string(),
            language: Some("en".to_string()),
            segments: vec![
                EngineSegment {
                    start: 0.0,
                    end: 1.5,
                    text: " Hello there.".to_string(),
                },
                EngineSegment {
                    start: 1.5,
                    end: 3.2,
                    text: " General Kenobi.  ".to_string(),
                },
            ],
            duration: Some(3.2),
        }
    }

    #[test]
    fn reshape_trims_segment_text_only() {
        let result = reshape(engine_output());

        assert_eq!(result.text, " Hello there. General Kenobi.");
        assert_eq!(result.segments[0].text, "Hello there.");
        assert_eq!(result.segments[1].text, "General Kenobi.");
        assert_eq!(result.segments[1].start, 1.5);
        assert_eq!(result.segments[1].end, 3.2);
        assert_eq!(result.duration, 3.2);
    }

    #[test]
    fn reshape_defaults_missing_fields() {
        let result = reshape(EngineOutput {
            language: None,
            duration: None,
            ..engine_output()
        });

        assert_eq!(result.language, "unknown");
        assert_eq!(result.duration, 0.0);
    }

    #[test]
    fn reshape_keeps_engine_segment_order() {
        let result = reshape(engine_output());

        assert!(result
            .segments
            .windows(2)
            .all(|pair| pair[0].start <= pair[1].start));
    }

    #[test]
    fn result_serializes_fields_in_schema_order() {
        let json = serde_json::to_string(&reshape(engine_output())).unwrap();

        let text = json.find("\"text\"").unwrap();
        let language = json.find("\"language\"").unwrap();
        let segments = json.find("\"segments\"").unwrap();
        let duration = json.find("\"duration\"").unwrap();
        assert!(text < language && language < segments && segments < duration);
    }
}
