//! Receiver-side reassembly of chunked transfers.
//!
//! The protocol does not guarantee ordered or complete chunk delivery, so
//! the assembler tracks which chunk offsets were written and only declares
//! a frame complete on `end` when every byte arrived. Duplicate and
//! reordered chunks are idempotent (last write per offset wins). A transfer
//! whose `end` never arrives is discarded after a staleness timeout — the
//! protocol has no explicit abort message.

use crate::messages::{TransferEnd, TransferStart};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct PendingTransfer {
    image_id: u32,
    buffer: Vec<u8>,
    total: u32,
    received: Vec<bool>,
    last_activity: Instant,
}

/// Reassembles one in-flight chunked transfer at a time.
///
/// A new `start` replaces any unfinished transfer; receivers tolerate
/// image id gaps since the sender consumes an id per attempt.
pub struct TransferAssembler {
    chunk_size: usize,
    stale_after: Duration,
    pending: Option<PendingTransfer>,
}

impl TransferAssembler {
    pub fn new(chunk_size: usize, stale_after: Duration) -> Self {
        Self {
            chunk_size,
            stale_after,
            pending: None,
        }
    }

    /// Whether a transfer is currently being assembled.
    pub fn in_flight(&self) -> Option<u32> {
        self.pending.as_ref().map(|p| p.image_id)
    }

    /// Begins a new transfer, discarding any unfinished one.
    pub fn on_start(&mut self, start: &TransferStart, now: Instant) {
        if let Some(old) = &self.pending {
            warn!(
                discarded = old.image_id,
                new = start.image_id,
                "new transfer started before previous completed"
            );
        }
        self.pending = Some(PendingTransfer {
            image_id: start.image_id,
            buffer: vec![0; start.size as usize],
            total: start.total,
            received: vec![false; start.total as usize],
            last_activity: now,
        });
    }

    /// Writes one chunk at `chunk_size * index`.
    ///
    /// Chunks for an unknown image id, out-of-range indexes, and bodies
    /// that would overflow the buffer are dropped.
    pub fn on_chunk(&mut self, image_id: u32, index: u32, body: &[u8], now: Instant) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        if pending.image_id != image_id || index >= pending.total {
            return;
        }
        let offset = self.chunk_size * index as usize;
        let Some(end) = offset.checked_add(body.len()) else {
            return;
        };
        if end > pending.buffer.len() {
            warn!(image_id, index, "chunk overflows announced size, dropped");
            return;
        }
        pending.buffer[offset..end].copy_from_slice(body);
        pending.received[index as usize] = true;
        pending.last_activity = now;
    }

    /// Completes the transfer if every chunk arrived.
    ///
    /// Returns the reassembled payload, or `None` when bytes are missing
    /// (the transfer stays pending until it goes stale).
    pub fn on_end(&mut self, end: &TransferEnd, now: Instant) -> Option<Vec<u8>> {
        let pending = self.pending.as_mut()?;
        if pending.image_id != end.image_id {
            return None;
        }
        pending.last_activity = now;
        if pending.received.iter().all(|&r| r) {
            let done = self.pending.take()?;
            debug!(image_id = done.image_id, size = done.buffer.len(), "transfer complete");
            Some(done.buffer)
        } else {
            let missing = pending.received.iter().filter(|&&r| !r).count();
            warn!(image_id = end.image_id, missing, "end received with chunks missing");
            None
        }
    }

    /// Discards a transfer with no activity within the staleness window.
    pub fn expire_stale(&mut self, now: Instant) {
        if let Some(pending) = &self.pending
            && now.duration_since(pending.last_activity) >= self.stale_after
        {
            warn!(image_id = pending.image_id, "stale transfer discarded");
            self.pending = None;
        }
    }
}
