//! Chunked transfer encoder.
//!
//! Fragments an opaque payload into bounded-size chunks framed by start and
//! end control messages. The protocol carries no acknowledgment and no
//! resume: if any publish fails the transfer stops immediately and the end
//! marker is never sent — absence of `end` within a timeout is the
//! receiver's only failure signal.

use crate::messages::{TransferEnd, TransferStart};
use crate::net::topics::TopicMap;
use tracing::{debug, warn};

/// One chunk's byte range within the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u32,
    pub offset: usize,
    pub len: usize,
}

/// Ordered fragmentation plan for one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan {
    pub image_id: u32,
    pub size: usize,
    pub chunks: Vec<ChunkRange>,
}

impl TransferPlan {
    /// Splits `size` bytes into `ceil(size / chunk_size)` contiguous ranges.
    pub fn new(size: usize, image_id: u32, chunk_size: usize) -> Self {
        let mut chunks = Vec::with_capacity(size.div_ceil(chunk_size));
        let mut offset = 0;
        while offset < size {
            let len = chunk_size.min(size - offset);
            chunks.push(ChunkRange {
                index: chunks.len() as u32,
                offset,
                len,
            });
            offset += len;
        }
        Self {
            image_id,
            size,
            chunks,
        }
    }

    pub fn total_chunks(&self) -> u32 {
        self.chunks.len() as u32
    }
}

/// Where encoded messages go; the connection manager implements this.
pub trait ChunkSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;
}

/// How far a transfer got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub image_id: u32,
    pub total_chunks: u32,
    pub sent_chunks: u32,
    /// True only when start, every chunk, and the end marker were published.
    pub completed: bool,
}

/// Publishes payloads as start/chunk/end message sequences.
#[derive(Debug, Clone)]
pub struct ChunkedEncoder {
    chunk_size: usize,
    topics: TopicMap,
}

impl ChunkedEncoder {
    pub fn new(topics: TopicMap, chunk_size: usize) -> Self {
        Self { chunk_size, topics }
    }

    /// Sends one payload as a chunked transfer.
    ///
    /// Stops at the first failed publish; previously sent chunks are never
    /// retried and the end marker is withheld so the receiver times out.
    pub fn send(&self, sink: &mut dyn ChunkSink, payload: &[u8], image_id: u32) -> TransferOutcome {
        let plan = TransferPlan::new(payload.len(), image_id, self.chunk_size);
        let mut outcome = TransferOutcome {
            image_id,
            total_chunks: plan.total_chunks(),
            sent_chunks: 0,
            completed: false,
        };

        let start = TransferStart {
            image_id,
            size: payload.len() as u32,
            total: plan.total_chunks(),
        };
        let Ok(start_body) = serde_json::to_vec(&start) else {
            return outcome;
        };
        if !sink.publish(&self.topics.image_start(image_id), &start_body) {
            warn!(image_id, "start publish failed, aborting transfer");
            return outcome;
        }

        for chunk in &plan.chunks {
            let topic = self.topics.image_chunk(image_id, chunk.index);
            let body = &payload[chunk.offset..chunk.offset + chunk.len];
            if !sink.publish(&topic, body) {
                warn!(
                    image_id,
                    index = chunk.index,
                    "chunk publish failed, aborting transfer"
                );
                return outcome;
            }
            outcome.sent_chunks += 1;
        }

        let end = TransferEnd { image_id };
        let Ok(end_body) = serde_json::to_vec(&end) else {
            return outcome;
        };
        if sink.publish(&self.topics.image_end(image_id), &end_body) {
            debug!(
                image_id,
                chunks = outcome.total_chunks,
                size = payload.len(),
                "image published"
            );
            outcome.completed = true;
        }
        outcome
    }
}
