use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::error;

use crate::error::{ErrorReport, TranscribeError};
use crate::TranscriptionResult;

/// Where a successful result is written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    #[default]
    Stdout,
    File(PathBuf),
}

impl From<Option<PathBuf>> for Destination {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(Destination::Stdout, Destination::File)
    }
}

/// Pretty-printed (two-space indent) success document.
pub fn render_result(result: &TranscriptionResult) -> String {
    // Plain data with string keys always serializes.
    serde_json::to_string_pretty(result).unwrap_or_default()
}

/// Compact failure document.
pub fn render_error(report: &ErrorReport) -> String {
    serde_json::to_string(report).unwrap_or_default()
}

/// Writes results to their destination and confirmations to `diagnostics`.
pub struct OutputWriter<O, D> {
    stdout: O,
    diagnostics: D,
}

impl OutputWriter<io::Stdout, io::Stderr> {
    pub fn standard() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, D: Write> OutputWriter<O, D> {
    pub fn new(stdout: O, diagnostics: D) -> Self {
        Self {
            stdout,
            diagnostics,
        }
    }

    pub fn write_result(
        &mut self,
        result: &TranscriptionResult,
        destination: &Destination,
    ) -> Result<(), TranscribeError> {
        let json = render_result(result);

        match destination {
            Destination::Stdout => {
                writeln!(self.stdout, "{json}")
                    .and_then(|()| self.stdout.flush())
                    .map_err(|source| io_failure(Path::new("<stdout>"), source))?;
            }
            Destination::File(path) => {
                fs::write(path, json.as_bytes()).map_err(|source| io_failure(path, source))?;
                let _ = writeln!(
                    self.diagnostics,
                    "Transcription saved to: {}",
                    path.display()
                );
            }
        }

        Ok(())
    }

    /// Failures always go to the primary stream so the caller can parse them.
    pub fn write_error(&mut self, report: &ErrorReport) -> io::Result<()> {
        writeln!(self.stdout, "{}", render_error(report))?;
        self.stdout.flush()
    }

    pub fn into_inner(self) -> (O, D) {
        (self.stdout, self.diagnostics)
    }
}

/// Run `f`, turning an error or a panic into an error document on the
/// primary stream. Returns the process exit code.
///
/// Panics unwind out of `f` before the report is written, so scoped guards
/// such as a stdout capture have already restored the stream.
pub fn report_failures<O: Write, D: Write>(
    writer: &mut OutputWriter<O, D>,
    f: impl FnOnce(&mut OutputWriter<O, D>) -> Result<(), TranscribeError>,
) -> i32 {
    let report = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *writer))) {
        Ok(Ok(())) => return 0,
        Ok(Err(e)) => {
            error!("{e}");
            ErrorReport::from(&e)
        }
        Err(payload) => ErrorReport::from_panic(payload.as_ref()),
    };

    let _ = writer.write_error(&report);
    1
}

fn io_failure(path: &Path, source: io::Error) -> TranscribeError {
    TranscribeError::IoFailure {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::Segment;

    fn result() -> TranscriptionResult {
        TranscriptionResult {
            text: " Hi.".to_string(),
            language: "en".to_string(),
            segments: vec![Segment {
                start: 0.0,
                end: 1.25,
                text: "Hi.".to_string(),
            }],
            duration: 1.25,
        }
    }

    #[test]
    fn stdout_receives_pretty_json() {
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());
        writer
            .write_result(&result(), &Destination::Stdout)
            .expect("write succeeds");
        let (stdout, diagnostics) = writer.into_inner();
        let stdout = String::from_utf8(stdout).unwrap();

        assert!(stdout.starts_with("{\n  \"text\": \" Hi.\",\n  \"language\": \"en\""));
        assert!(stdout.contains("\n      \"start\": 0.0,"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn file_destination_keeps_stdout_clean() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());

        writer
            .write_result(&result(), &Destination::File(path.clone()))
            .expect("write succeeds");
        let (stdout, diagnostics) = writer.into_inner();

        assert!(stdout.is_empty());
        assert_eq!(
            String::from_utf8(diagnostics).unwrap(),
            format!("Transcription saved to: {}\n", path.display())
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), render_result(&result()));
    }

    #[test]
    fn unwritable_file_is_io_failure() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing-dir").join("out.json");
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());

        let error = writer
            .write_result(&result(), &Destination::File(path))
            .expect_err("parent directory does not exist");

        assert_eq!(error.category(), "IOFailure");
    }

    #[test]
    fn errors_are_compact_on_stdout() {
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());
        writer
            .write_error(&ErrorReport::new("boom", "EngineFailure"))
            .unwrap();
        let (stdout, _) = writer.into_inner();

        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "{\"error\":\"boom\",\"type\":\"EngineFailure\"}\n"
        );
    }

    #[test]
    fn success_exits_zero_without_report() {
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());

        let code = report_failures(&mut writer, |writer| {
            writer.write_result(&result(), &Destination::Stdout)
        });
        let (stdout, _) = writer.into_inner();

        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            format!("{}\n", render_result(&result()))
        );
    }

    #[test]
    fn error_exits_one_with_report() {
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());

        let code = report_failures(&mut writer, |_| {
            Err(TranscribeError::FileNotFound {
                path: PathBuf::from("gone.mp4"),
            })
        });
        let (stdout, _) = writer.into_inner();

        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "{\"error\":\"Video file not found: gone.mp4\",\"type\":\"FileNotFound\"}\n"
        );
    }

    #[test]
    fn panic_exits_one_with_report() {
        let mut writer = OutputWriter::new(Vec::new(), Vec::new());

        let code = report_failures(&mut writer, |_| panic!("engine panicked"));
        let (stdout, _) = writer.into_inner();

        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "{\"error\":\"engine panicked\",\"type\":\"Panic\"}\n"
        );
    }

    #[test]
    fn destination_from_optional_path() {
        assert_eq!(Destination::from(None), Destination::Stdout);
        assert_eq!(
            Destination::from(Some(PathBuf::from("a.json"))),
            Destination::File(PathBuf::from("a.json"))
        );
    }
}
