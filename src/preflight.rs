use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::TranscribeError;

/// Name of the media decoder executable looked up on the search path.
pub const DECODER_PROGRAM: &str = "ffmpeg";

/// Checks that must pass before any model is loaded.
#[derive(Debug, Clone)]
pub struct Preflight {
    program: String,
    search_path: Option<OsString>,
}

impl Default for Preflight {
    fn default() -> Self {
        Self::new(DECODER_PROGRAM)
    }
}

impl Preflight {
    /// Look `program` up on the process `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Look `program` up on an explicit search path instead of `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Resolve the decoder executable.
    pub fn check_decoder(&self) -> Result<PathBuf, TranscribeError> {
        self.search_path
            .as_deref()
            .and_then(|search_path| find_executable(&self.program, search_path))
            .ok_or_else(|| TranscribeError::DependencyMissing {
                program: self.program.clone(),
            })
    }

    pub fn check_input(&self, video_path: &Path) -> Result<(), TranscribeError> {
        if video_path.exists() {
            Ok(())
        } else {
            Err(TranscribeError::FileNotFound {
                path: video_path.to_path_buf(),
            })
        }
    }

    /// Decoder first, then the input file. Returns the resolved decoder.
    pub fn run(&self, video_path: &Path) -> Result<PathBuf, TranscribeError> {
        let decoder = self.check_decoder()?;
        self.check_input(video_path)?;
        Ok(decoder)
    }
}

/// First entry of `search_path` holding an executable named `program`.
pub fn find_executable(program: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidate_names(program).map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidate_names(program: &str) -> impl Iterator<Item = String> + '_ {
    ["", ".exe", ".cmd", ".bat"]
        .into_iter()
        .map(move |ext| format!("{program}{ext}"))
}

#[cfg(not(windows))]
fn candidate_names(program: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
