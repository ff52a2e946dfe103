use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::{Env, Target};

use glimpse_transcribe::engines::whisper::WhisperEngine;
use glimpse_transcribe::models::ModelStore;
use glimpse_transcribe::output::{report_failures, Destination, OutputWriter};
use glimpse_transcribe::preflight::Preflight;
use glimpse_transcribe::transcriber::Transcriber;
use glimpse_transcribe::{ModelTier, TranscribeError, TranscriptionRequest};

/// Transcribe a video with a local Whisper model and print timestamped JSON.
#[derive(Parser)]
#[command(name = "glimpse-transcribe", version)]
struct Cli {
    /// Path to the video file.
    video_path: PathBuf,

    /// Whisper model tier.
    #[arg(long, value_enum, default_value_t = ModelTier::Base)]
    model: ModelTier,

    /// Language code (e.g. 'en'); auto-detected when omitted.
    #[arg(long)]
    language: Option<String>,

    /// Translate the speech to English.
    #[arg(long)]
    translate: bool,

    /// Write the JSON result to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory holding ggml model files (default: user cache directory).
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Inference threads (default: available cores, at most 8).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();
    let mut writer = OutputWriter::standard();

    // The default panic hook reports to stderr; the JSON document follows
    // once the stack has unwound.
    let code = report_failures(&mut writer, |writer| run(cli, writer));
    process::exit(code);
}

fn run(
    cli: Cli,
    writer: &mut OutputWriter<std::io::Stdout, std::io::Stderr>,
) -> Result<(), TranscribeError> {
    let request = TranscriptionRequest::new(
        cli.video_path,
        cli.model,
        cli.language.as_deref(),
        cli.translate,
    );

    let models = match cli.model_dir {
        Some(dir) => ModelStore::new(dir),
        None => ModelStore::in_cache_dir(),
    };

    let mut transcriber = Transcriber::new(WhisperEngine::new(), Preflight::default(), models)
        .with_threads(cli.threads);
    let result = transcriber.run(&request)?;

    writer.write_result(&result, &Destination::from(cli.output))
}
