use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

/// Size/quality variant of the pretrained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModelTier {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }

    /// ggml weights file published for this tier.
    pub fn model_file_name(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "ggml-tiny.bin",
            ModelTier::Base => "ggml-base.bin",
            ModelTier::Small => "ggml-small.bin",
            ModelTier::Medium => "ggml-medium.bin",
            ModelTier::Large => "ggml-large-v3.bin",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskMode {
    /// Source-language audio to same-language text.
    #[default]
    Transcribe,
    /// Source-language audio to English text.
    Translate,
}

impl TaskMode {
    pub fn from_translate_flag(translate: bool) -> Self {
        if translate {
            TaskMode::Translate
        } else {
            TaskMode::Transcribe
        }
    }

    pub fn is_translate(&self) -> bool {
        matches!(self, TaskMode::Translate)
    }

    /// Verb used in progress messages.
    pub fn action(&self) -> &'static str {
        match self {
            TaskMode::Transcribe => "Transcribing",
            TaskMode::Translate => "Translating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub video_path: PathBuf,
    pub model_tier: ModelTier,
    /// `None` means auto-detect.
    pub language_hint: Option<String>,
    pub task: TaskMode,
}

impl TranscriptionRequest {
    pub fn new(
        video_path: impl Into<PathBuf>,
        model_tier: ModelTier,
        language_hint: Option<&str>,
        translate: bool,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            model_tier,
            language_hint: normalize_language_hint(language_hint),
            task: TaskMode::from_translate_flag(translate),
        }
    }
}

/// Blank values and `auto` collapse to `None`; anything else is forwarded
/// trimmed, case untouched.
pub fn normalize_language_hint(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return None;
    }

    Some(raw.to_string())
}
