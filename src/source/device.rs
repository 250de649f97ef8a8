//! Byte source abstraction and the device-backed implementation.
//!
//! The trait allows swapping between real noise devices and synthetic
//! sources for testing.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading from a byte source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The device could not be opened.
    #[error("failed to open byte source {path}: {error}")]
    Open {
        /// Device path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },
    /// A single read failed.
    #[error("failed to read from byte source: {0}")]
    Read(#[from] io::Error),
    /// End of file; no further bytes will arrive.
    #[error("byte source exhausted")]
    Exhausted,
}

/// Trait for providers of single raw bytes.
///
/// A read may fail transiently; callers decide whether to retry.
pub trait ByteSource {
    /// Reads exactly one raw byte.
    fn read_byte(&mut self) -> Result<u8, SourceError>;

    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        (**self).read_byte()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        (**self).read_byte()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A byte source backed by a character device or regular file.
///
/// Reads are unbuffered: every byte is a fresh read from the device so
/// that a blocking hardware source paces the generator directly.
#[derive(Debug)]
pub struct DeviceSource {
    path: PathBuf,
    name: String,
    file: File,
}

impl DeviceSource {
    /// Opens the device at `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|error| SourceError::Open {
            path: path.clone(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "Opened byte source");
        Ok(Self {
            name: path.display().to_string(),
            path,
            file,
        })
    }

    /// Returns the path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for DeviceSource {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        let mut buf = [0u8; 1];
        match self.file.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(SourceError::Exhausted),
            Err(e) => Err(SourceError::Read(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
