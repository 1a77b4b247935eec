//! Audio peripheral seam and the blocking capture cycle.
//!
//! One capture cycle pulls fixed-size blocks from the peripheral until the
//! window is full. Each block read is a bounded wait; a peripheral error
//! aborts the cycle immediately and the window is discarded.

use crate::audio::window::SampleWindow;
use crate::error::{Result, WakecamError};

/// Trait for the audio peripheral.
///
/// This trait allows swapping implementations (real device vs mock).
pub trait AudioSource {
    /// Start the peripheral (install drivers, clear DMA buffers).
    fn start(&mut self) -> Result<()>;

    /// Stop the peripheral.
    fn stop(&mut self) -> Result<()>;

    /// Read up to `block.len()` samples with a bounded wait
    /// (implementations should stay near [`defaults::BLOCK_READ_TIMEOUT`]).
    ///
    /// [`defaults::BLOCK_READ_TIMEOUT`]: crate::defaults::BLOCK_READ_TIMEOUT
    ///
    /// # Returns
    /// Number of samples written into `block`; zero means no data was
    /// available within the wait.
    fn read_block(&mut self, block: &mut [i16]) -> Result<usize>;
}

/// Fills `window` from `source` by repeated block reads.
///
/// The peripheral is started for the duration of the cycle and stopped
/// afterwards. The window is zeroed first. Any error aborts immediately
/// with the window left discarded (reset); no partial classification is
/// attempted. Zero-length reads are retried, the peripheral had no data
/// yet.
pub fn capture_window(
    source: &mut dyn AudioSource,
    window: &mut SampleWindow,
    block_samples: usize,
) -> Result<()> {
    window.reset();
    source.start()?;
    let mut block = vec![0i16; block_samples];

    while !window.is_full() {
        let read = match source.read_block(&mut block) {
            Ok(read) => read,
            Err(e) => {
                window.reset();
                if let Err(stop_err) = source.stop() {
                    tracing::warn!(error = %stop_err, "audio stop failed after read error");
                }
                return Err(e);
            }
        };
        if read == 0 {
            continue;
        }
        window.push_block(&block[..read]);
    }
    source.stop()?;
    Ok(())
}

/// Mock audio source for testing
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    samples: Vec<i16>,
    position: usize,
    fail_after_reads: Option<usize>,
    reads: usize,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock that yields silence forever.
    pub fn new() -> Self {
        Self {
            is_started: false,
            samples: Vec::new(),
            position: 0,
            fail_after_reads: None,
            reads: 0,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the samples the mock streams out; repeats from the start
    /// once exhausted.
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self
    }

    /// Configure the mock to fail on the (n+1)-th read.
    pub fn with_read_failure_after(mut self, reads: usize) -> Self {
        self.fail_after_reads = Some(reads);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_block(&mut self, block: &mut [i16]) -> Result<usize> {
        if let Some(limit) = self.fail_after_reads
            && self.reads >= limit
        {
            return Err(WakecamError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.reads += 1;

        if self.samples.is_empty() {
            block.fill(0);
            return Ok(block.len());
        }

        for slot in block.iter_mut() {
            *slot = self.samples[self.position % self.samples.len()];
            self.position += 1;
        }
        Ok(block.len())
    }
}
