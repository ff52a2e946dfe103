//! Scoped capture of the process's standard output.
//!
//! Native inference code may `printf` progress text straight to file
//! descriptor 1. While a [`StdoutCapture`] is alive that descriptor points at a
//! scratch file; dropping or finishing the capture puts the original stream
//! back, whether or not the guarded work succeeded.

use std::io::{self, Write};

/// Run `f` with standard output captured, returning its result together with
/// whatever was written to the stream meanwhile.
pub fn with_captured_stdout<T>(f: impl FnOnce() -> T) -> io::Result<(T, String)> {
    let capture = StdoutCapture::begin()?;
    let value = f();
    let captured = capture.finish()?;
    Ok((value, captured))
}

#[cfg(unix)]
pub use unix::StdoutCapture;

#[cfg(not(unix))]
pub use fallback::StdoutCapture;

fn flush_all() {
    let _ = io::stdout().flush();
    // SAFETY: fflush(NULL) flushes every open C stdio output stream.
    #[cfg(unix)]
    let _ = unsafe { libc::fflush(std::ptr::null_mut()) };
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read, Seek, SeekFrom};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
    use std::sync::{Mutex, MutexGuard};

    use super::flush_all;

    const STDOUT_FD: RawFd = libc::STDOUT_FILENO;

    /// Descriptor 1 is process-wide, so captures never overlap.
    static CAPTURE_LOCK: Mutex<()> = Mutex::new(());

    pub struct StdoutCapture {
        saved: Option<OwnedFd>,
        sink: File,
        _lock: MutexGuard<'static, ()>,
    }

    impl StdoutCapture {
        pub fn begin() -> io::Result<Self> {
            let lock = CAPTURE_LOCK
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let sink = tempfile::tempfile()?;
            flush_all();

            // SAFETY: dup on a descriptor owned by the process for its lifetime.
            let saved = unsafe { libc::dup(STDOUT_FD) };
            if saved < 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: `saved` is a fresh descriptor returned by dup above.
            let saved = unsafe { OwnedFd::from_raw_fd(saved) };

            // SAFETY: both descriptors are open.
            if unsafe { libc::dup2(sink.as_raw_fd(), STDOUT_FD) } < 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                saved: Some(saved),
                sink,
                _lock: lock,
            })
        }

        /// Restore standard output and return the captured text.
        pub fn finish(mut self) -> io::Result<String> {
            self.restore()?;

            let mut bytes = Vec::new();
            self.sink.seek(SeekFrom::Start(0))?;
            self.sink.read_to_end(&mut bytes)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }

        fn restore(&mut self) -> io::Result<()> {
            let Some(saved) = self.saved.take() else {
                return Ok(());
            };

            flush_all();
            // SAFETY: `saved` still refers to the original stdout.
            if unsafe { libc::dup2(saved.as_raw_fd(), STDOUT_FD) } < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl Drop for StdoutCapture {
        fn drop(&mut self) {
            let _ = self.restore();
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    use std::io;

    use super::flush_all;

    /// Descriptor redirection is unix-only; elsewhere the engine's print flags
    /// are the only suppression and nothing is captured.
    pub struct StdoutCapture {
        _private: (),
    }

    impl StdoutCapture {
        pub fn begin() -> io::Result<Self> {
            flush_all();
            Ok(Self { _private: () })
        }

        pub fn finish(self) -> io::Result<String> {
            flush_all();
            Ok(String::new())
        }
    }
}
