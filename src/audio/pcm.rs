//! Host-side audio sources.
//!
//! Embedded deployments put an I2S microphone behind the `AudioSource`
//! seam. On a host these stand in: a raw PCM file served cyclically, or
//! plain silence for wiring tests.

use crate::audio::capture::AudioSource;
use crate::error::{Result, WakecamError};
use std::path::Path;

/// Serves samples from a raw little-endian i16 PCM file, wrapping around
/// when the file is exhausted.
pub struct PcmFileSource {
    samples: Vec<i16>,
    cursor: usize,
}

impl PcmFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(WakecamError::AudioCapture {
                message: format!("empty PCM file: {}", path.display()),
            });
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self { samples, cursor: 0 })
    }
}

impl AudioSource for PcmFileSource {
    fn start(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_block(&mut self, block: &mut [i16]) -> Result<usize> {
        for slot in block.iter_mut() {
            *slot = self.samples[self.cursor % self.samples.len()];
            self.cursor += 1;
        }
        Ok(block.len())
    }
}

/// Produces only zero samples.
#[derive(Debug, Default)]
pub struct SilenceSource;

impl AudioSource for SilenceSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_block(&mut self, block: &mut [i16]) -> Result<usize> {
        block.fill(0);
        Ok(block.len())
    }
}
