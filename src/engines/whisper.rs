use std::path::{Path, PathBuf};

use log::debug;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::{EngineOutput, EngineSegment, InferenceParams, TranscriptionEngine};

const MAX_THREADS: usize = 8;

#[derive(Debug, Clone)]
pub struct WhisperModelParams {
    pub use_gpu: bool,
}

impl Default for WhisperModelParams {
    fn default() -> Self {
        Self { use_gpu: true }
    }
}

/// whisper.cpp through whisper-rs.
pub struct WhisperEngine {
    loaded_model_path: Option<PathBuf>,
    context: Option<WhisperContext>,
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WhisperEngine {
    pub fn new() -> Self {
        // whisper.cpp and ggml log through the `log` facade instead of
        // writing to the standard streams themselves. Idempotent.
        whisper_rs::install_whisper_log_trampoline();

        Self {
            loaded_model_path: None,
            context: None,
        }
    }

    pub fn loaded_model_path(&self) -> Option<&Path> {
        self.loaded_model_path.as_deref()
    }
}

impl TranscriptionEngine for WhisperEngine {
    type ModelParams = WhisperModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu = params.use_gpu;

        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            context_params,
        )
        .map_err(|e| format!("Failed to load Whisper model {}: {e}", model_path.display()))?;

        self.loaded_model_path = Some(model_path.to_path_buf());
        self.context = Some(context);
        Ok(())
    }

    fn transcribe_samples(
        &mut self,
        samples: Vec<f32>,
        params: &InferenceParams,
    ) -> Result<EngineOutput, Box<dyn std::error::Error>> {
        let context = self
            .context
            .as_ref()
            .ok_or("Model not loaded. Call load_model() first.")?;

        let mut state = context
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let language = params.language.as_deref().unwrap_or("auto");
        let n_threads = params
            .n_threads
            .unwrap_or_else(|| available_threads().min(MAX_THREADS))
            .max(1);

        let mut full_params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        full_params.set_language(Some(language));
        full_params.set_translate(params.task.is_translate());
        full_params.set_token_timestamps(false);
        full_params.set_print_special(false);
        full_params.set_print_progress(false);
        full_params.set_print_realtime(false);
        full_params.set_print_timestamps(false);
        full_params.set_n_threads(i32::try_from(n_threads).unwrap_or(1));

        debug!(
            "running whisper: language={language} task={:?} threads={n_threads}",
            params.task
        );
        state
            .full(full_params, &samples)
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let num_segments = state.full_n_segments()?;
        let mut text = String::new();
        let mut segments = Vec::with_capacity(usize::try_from(num_segments).unwrap_or(0));

        for index in 0..num_segments {
            let segment_text = state.full_get_segment_text_lossy(index)?;
            // Timestamps come back in centiseconds.
            let start = state.full_get_segment_t0(index)? as f64 / 100.0;
            let end = state.full_get_segment_t1(index)? as f64 / 100.0;

            text.push_str(&segment_text);
            segments.push(EngineSegment {
                start,
                end,
                text: segment_text,
            });
        }

        let language = match &params.language {
            Some(hint) => Some(hint.clone()),
            None => state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(str::to_string),
        };

        Ok(EngineOutput {
            text,
            language,
            segments,
            duration: Some(audio::duration_secs(&samples)),
        })
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
