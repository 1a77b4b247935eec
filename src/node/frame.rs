//! Frame-producing peripheral seam for the camera node.

use crate::error::{Result, WakecamError};

/// Trait for the camera peripheral.
///
/// A real implementation is expected to discard a few warm-up frames for
/// color calibration before returning the JPEG it keeps; that detail stays
/// behind this seam.
pub trait FrameSource {
    /// Capture one JPEG frame.
    fn capture(&mut self) -> Result<Vec<u8>>;
}

/// Frame source that re-reads a JPEG file on every capture.
///
/// Stands in for the camera peripheral on hosts without one; the file can
/// be swapped out between captures.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: std::path::PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for FileFrameSource {
    fn capture(&mut self) -> Result<Vec<u8>> {
        let frame = std::fs::read(&self.path).map_err(|e| WakecamError::FrameCapture {
            message: format!("{}: {}", self.path.display(), e),
        })?;
        if frame.is_empty() {
            return Err(WakecamError::FrameCapture {
                message: format!("{}: empty frame file", self.path.display()),
            });
        }
        Ok(frame)
    }
}

/// Mock frame source for testing
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    frame: Vec<u8>,
    fail_message: Option<String>,
    captures: usize,
}

impl MockFrameSource {
    /// Create a mock returning a small fixed frame.
    pub fn new() -> Self {
        Self {
            frame: vec![0xFF, 0xD8, 0xFF, 0xE0],
            fail_message: None,
            captures: 0,
        }
    }

    /// Configure the frame bytes returned by `capture`.
    pub fn with_frame(mut self, frame: Vec<u8>) -> Self {
        self.frame = frame;
        self
    }

    /// Configure the mock to fail every capture.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.fail_message = Some(message.to_string());
        self
    }

    /// Number of capture attempts seen.
    pub fn captures(&self) -> usize {
        self.captures
    }
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockFrameSource {
    fn capture(&mut self) -> Result<Vec<u8>> {
        self.captures += 1;
        if let Some(message) = &self.fail_message {
            return Err(WakecamError::FrameCapture {
                message: message.clone(),
            });
        }
        Ok(self.frame.clone())
    }
}
