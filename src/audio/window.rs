//! Fixed-capacity sample window for classification.
//!
//! Allocated once at startup, overwritten in place each capture cycle,
//! never resized. The classifier always sees exactly `capacity` samples;
//! positions beyond what has been captured stay zero.

use crate::error::{Result, WakecamError};

/// Fixed-length buffer of signed 16-bit audio samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Vec<i16>,
    filled: usize,
}

impl SampleWindow {
    /// Allocates a window of exactly `capacity` samples, zero-filled.
    ///
    /// Allocation failure is the one startup error the node cannot degrade
    /// through, so it is surfaced instead of aborting.
    pub fn new(capacity: usize) -> Result<Self> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|_| WakecamError::WindowAllocation { samples: capacity })?;
        samples.resize(capacity, 0);
        Ok(Self { samples, filled: 0 })
    }

    /// Total sample capacity, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples written since the last reset.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// True once the window holds `capacity` captured samples.
    pub fn is_full(&self) -> bool {
        self.filled == self.samples.len()
    }

    /// Zeroes the buffer and rewinds the fill position.
    pub fn reset(&mut self) {
        self.samples.fill(0);
        self.filled = 0;
    }

    /// Copies samples from `block` into the window, up to remaining capacity.
    ///
    /// Returns the number of samples consumed.
    pub fn push_block(&mut self, block: &[i16]) -> usize {
        let take = block.len().min(self.samples.len() - self.filled);
        self.samples[self.filled..self.filled + take].copy_from_slice(&block[..take]);
        self.filled += take;
        take
    }

    /// Full window contents, zero-padded past the fill position.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Peak-to-peak amplitude of the captured samples.
    ///
    /// Used as a low-confidence heuristic for a disconnected or broken
    /// microphone before classification runs.
    pub fn dynamic_range(&self) -> i32 {
        match (self.samples.iter().min(), self.samples.iter().max()) {
            (Some(&min), Some(&max)) => i32::from(max) - i32::from(min),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_is_zeroed() {
        let window = SampleWindow::new(16).unwrap();
        assert_eq!(window.capacity(), 16);
        assert_eq!(window.filled(), 0);
        assert!(window.samples().iter().all(|&s| s == 0));
        assert!(!window.is_full());
    }

    #[test]
    fn test_push_block_fills_in_order() {
        let mut window = SampleWindow::new(8).unwrap();
        assert_eq!(window.push_block(&[1, 2, 3]), 3);
        assert_eq!(window.push_block(&[4, 5]), 2);
        assert_eq!(window.filled(), 5);
        assert_eq!(&window.samples()[..5], &[1, 2, 3, 4, 5]);
        // Uncaptured tail stays zero
        assert_eq!(&window.samples()[5..], &[0, 0, 0]);
    }

    #[test]
    fn test_push_block_truncates_at_capacity() {
        let mut window = SampleWindow::new(4).unwrap();
        assert_eq!(window.push_block(&[1, 2, 3, 4, 5, 6]), 4);
        assert!(window.is_full());
        assert_eq!(window.samples(), &[1, 2, 3, 4]);
        // Further pushes consume nothing
        assert_eq!(window.push_block(&[7, 8]), 0);
        assert_eq!(window.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_reset_zeroes_and_rewinds() {
        let mut window = SampleWindow::new(4).unwrap();
        window.push_block(&[100, -100, 50, 25]);
        assert!(window.is_full());

        window.reset();
        assert_eq!(window.filled(), 0);
        assert!(window.samples().iter().all(|&s| s == 0));
        // Capacity never changes
        assert_eq!(window.capacity(), 4);
    }

    #[test]
    fn test_dynamic_range_of_silence_is_zero() {
        let window = SampleWindow::new(16).unwrap();
        assert_eq!(window.dynamic_range(), 0);
    }

    #[test]
    fn test_dynamic_range_peak_to_peak() {
        let mut window = SampleWindow::new(4).unwrap();
        window.push_block(&[-200, 0, 150, 10]);
        assert_eq!(window.dynamic_range(), 350);
    }

    #[test]
    fn test_dynamic_range_extremes_do_not_overflow() {
        let mut window = SampleWindow::new(2).unwrap();
        window.push_block(&[i16::MIN, i16::MAX]);
        assert_eq!(window.dynamic_range(), 65535);
    }
}
