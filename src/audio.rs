use std::path::Path;

use thiserror::Error;

/// Sample rate the engine expects, in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

#[derive(Error, Debug)]
pub enum AudioFormatError {
    #[error("failed to read WAV {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: hound::Error,
    },
    #[error("Expected 1 channel, found {0}")]
    Channels(u16),
    #[error("Expected 16000 Hz sample rate, found {0} Hz")]
    SampleRate(u32),
    #[error("Expected 16 bits per sample, found {0}")]
    BitsPerSample(u16),
    #[error("Expected Int sample format, found {0:?}")]
    SampleFormat(hound::SampleFormat),
}

/// Load a 16 kHz, mono, PCM int16 WAV file as f32 samples in [-1, 1].
pub fn read_wav_samples(wav_path: &Path) -> Result<Vec<f32>, AudioFormatError> {
    let read_error = |source| AudioFormatError::Read {
        path: wav_path.display().to_string(),
        source,
    };

    let mut reader = hound::WavReader::open(wav_path).map_err(read_error)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(AudioFormatError::Channels(spec.channels));
    }
    if spec.sample_rate != SAMPLE_RATE {
        return Err(AudioFormatError::SampleRate(spec.sample_rate));
    }
    if spec.bits_per_sample != 16 {
        return Err(AudioFormatError::BitsPerSample(spec.bits_per_sample));
    }
    if spec.sample_format != hound::SampleFormat::Int {
        return Err(AudioFormatError::SampleFormat(spec.sample_format));
    }

    reader
        .samples::<i16>()
        .map(|sample| sample.map(|s| s as f32 / i16::MAX as f32))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)
}

/// Length in seconds of a 16 kHz sample buffer.
pub fn duration_secs(samples: &[f32]) -> f64 {
    samples.len() as f64 / f64::from(SAMPLE_RATE)
}
