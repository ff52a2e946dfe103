use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::debug;
use thiserror::Error;

use crate::audio::{self, AudioFormatError, SAMPLE_RATE};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} could not decode {input} ({status}): {stderr}")]
    Failed {
        program: String,
        input: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Audio(#[from] AudioFormatError),
}

/// Extracts the audio track of a media file with an external decoder binary.
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    program: PathBuf,
}

impl AudioExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Decode `input` to 16 kHz mono f32 samples.
    ///
    /// The decoder writes a PCM16 WAV into a scratch directory that is removed
    /// when this returns.
    pub fn extract(&self, input: &Path) -> Result<Vec<f32>, DecodeError> {
        let scratch = tempfile::Builder::new()
            .prefix("glimpse-transcribe-")
            .tempdir()
            .map_err(DecodeError::Scratch)?;
        let wav_path = scratch.path().join("audio.wav");

        let program = self.program.display().to_string();
        debug!("decoding {} with {}", input.display(), program);

        let output = Command::new(&self.program)
            .args(decoder_args(input, &wav_path))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DecodeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DecodeError::Failed {
                program,
                input: input.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let samples = audio::read_wav_samples(&wav_path)?;
        debug!(
            "decoded {} samples ({:.2}s)",
            samples.len(),
            audio::duration_secs(&samples)
        );
        Ok(samples)
    }
}

fn decoder_args(input: &Path, wav_path: &Path) -> Vec<OsString> {
    let sample_rate = SAMPLE_RATE.to_string();
    let mut args: Vec<OsString> = vec![
        "-nostdin".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.into(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        sample_rate.into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-f".into(),
        "wav".into(),
    ];
    args.push(wav_path.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_request_mono_16khz_pcm_wav() {
        let args = decoder_args(Path::new("in.mp4"), Path::new("/tmp/out.wav"));
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let position = |flag: &str| args.iter().position(|arg| arg == flag).unwrap();
        assert_eq!(args[position("-i") + 1], "in.mp4");
        assert_eq!(args[position("-ac") + 1], "1");
        assert_eq!(args[position("-ar") + 1], "16000");
        assert_eq!(args[position("-c:a") + 1], "pcm_s16le");
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.wav"));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let extractor = AudioExtractor::new("/nonexistent/ffmpeg");

        let error = extractor
            .extract(Path::new("in.mp4"))
            .expect_err("program does not exist");

        assert!(matches!(error, DecodeError::Spawn { .. }));
    }
}
