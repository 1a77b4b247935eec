//! Chunked binary transfer protocol for JPEG frames.

pub mod assembler;
pub mod encoder;

pub use assembler::TransferAssembler;
pub use encoder::{ChunkRange, ChunkSink, ChunkedEncoder, TransferOutcome, TransferPlan};
