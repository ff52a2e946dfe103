use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::request::ModelTier;

/// Repository serving the ggml weights for every tier.
pub const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Locates (and on first use downloads) the weights for a model tier.
#[derive(Debug, Clone)]
pub struct ModelStore {
    /// `None` when no cache directory could be determined.
    dir: Option<PathBuf>,
    base_url: String,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            base_url: MODEL_BASE_URL.to_string(),
        }
    }

    /// Store rooted at the user cache directory. A missing cache directory
    /// only surfaces once a model is resolved.
    pub fn in_cache_dir() -> Self {
        Self {
            dir: model_cache_dir().ok(),
            base_url: MODEL_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model_path(&self, tier: ModelTier) -> Result<PathBuf, ModelResolveError> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(tier.model_file_name()))
            .ok_or(ModelResolveError::NoCacheDir)
    }

    pub fn model_url(&self, tier: ModelTier) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            tier.model_file_name()
        )
    }

    /// Path of the weights for `tier`, downloading them if absent.
    pub fn resolve(&self, tier: ModelTier) -> Result<PathBuf, ModelResolveError> {
        let path = self.model_path(tier)?;
        if path.exists() {
            return Ok(path);
        }

        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(|source| ModelResolveError::ModelDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let url = self.model_url(tier);
        info!("Downloading {tier} model from {url}");
        download(&url, &path)?;
        Ok(path)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Caches/glimpse-transcribe/models/`
/// - Linux: `$XDG_CACHE_HOME/glimpse-transcribe/models/` or `~/.cache/glimpse-transcribe/models/`
/// - Windows: `%LOCALAPPDATA%/glimpse-transcribe/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|dir| dir.join("glimpse-transcribe").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);

    // Clean up .part file on any error
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let write_error = |path: &Path, source| ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(temp_path).map_err(|e| write_error(temp_path, e))?;

    let mut downloaded: u64 = 0;
    let mut next_report: u64 = 0;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| write_error(temp_path, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| write_error(temp_path, e))?;
        downloaded += n as u64;

        if total > 0 && downloaded >= next_report {
            info!("downloaded {}%", downloaded * 100 / total);
            next_report += total / 10;
        }
    }

    file.flush().map_err(|e| write_error(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| write_error(dest, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn resolve_returns_existing_model_without_download() {
        let tmp = TempDir::new().unwrap();
        let store =
            ModelStore::new(tmp.path()).with_base_url("http://invalid.nonexistent.example.com");
        fs::write(store.model_path(ModelTier::Tiny).unwrap(), b"fake weights").unwrap();

        let path = store.resolve(ModelTier::Tiny).expect("cached model resolves");

        assert_eq!(path, tmp.path().join("ggml-tiny.bin"));
    }

    #[test]
    fn model_url_joins_file_name() {
        let store = ModelStore::new("/models").with_base_url("https://example.com/weights/");

        assert_eq!(
            store.model_url(ModelTier::Large),
            "https://example.com/weights/ggml-large-v3.bin"
        );
    }

    #[test]
    fn cache_dir_is_namespaced() {
        let dir = model_cache_dir().expect("cache dir available");

        assert!(dir.ends_with("glimpse-transcribe/models"));
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path().join("models"))
            .with_base_url("http://invalid.nonexistent.example.com");

        let error = store
            .resolve(ModelTier::Base)
            .expect_err("unreachable host");

        assert!(matches!(error, ModelResolveError::Download { .. }));
        let model = store.model_path(ModelTier::Base).unwrap();
        assert!(!model.exists());
        assert!(!model.with_extension("part").exists());
    }
}
