//! Chunked file-processing pipeline.
//!
//! Three cooperating pieces: the [`pool::ChunkPool`] partitions a
//! payload and polices buffer lifecycles, the [`handler::FileHandler`]
//! owns the streams and the ordered-writeback thread, and the
//! [`order::OrderedQueue`] restores index order inside the writer.
//! The orchestration that drives them lives in [`crate::processor`].

pub mod handler;
pub mod order;
pub mod pool;
