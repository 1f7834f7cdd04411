//! Chunk pool: payload partitioning and buffer lifecycle.
//!
//! A [`ChunkPool`] partitions a known payload length into fixed-size
//! chunks and tracks each chunk's buffer through its single pass over
//! the pipeline: allocated on first acquire, owned by exactly one stage
//! at a time, retired once the writer has flushed it. The pool never
//! holds the bytes itself; ownership moves with the buffer. The
//! per-index ledger turns protocol violations (double acquire, double
//! free) into [`EngineError::Corrupt`] instead of silent reuse.

use std::sync::Mutex;

use crate::error::{EngineError, EngineResult};

/// Lifecycle of one chunk slot.
enum Slot {
    /// Never touched; `acquire` will allocate.
    Vacant,
    /// Buffer handed out to the reader/worker/writer chain.
    Loaned,
    /// Flushed and dropped; terminal.
    Freed,
}

pub struct ChunkPool {
    chunk_size: u64,
    total_len: u64,
    chunk_count: u64,
    last_len: u64,
    slots: Vec<Mutex<Slot>>,
}

impl ChunkPool {
    /// Partitions `total_len` bytes into `ceil(total_len / chunk_size)`
    /// chunks; the final chunk carries the remainder.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInput`] for a zero or odd chunk size; the
    /// byte-pair transform requires even chunk boundaries.
    pub fn new(total_len: u64, chunk_size: u64) -> EngineResult<Self> {
        if chunk_size == 0 || chunk_size & 1 == 1 {
            return Err(EngineError::InvalidInput(format!(
                "chunk size must be non-zero and even, got {chunk_size}"
            )));
        }

        let chunk_count = total_len.div_ceil(chunk_size);
        let last_len = if total_len == 0 {
            0
        } else if total_len % chunk_size == 0 {
            chunk_size
        } else {
            total_len % chunk_size
        };

        let slots = (0..chunk_count).map(|_| Mutex::new(Slot::Vacant)).collect();

        Ok(Self { chunk_size, total_len, chunk_count, last_len, slots })
    }

    #[inline]
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    #[inline]
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Length of chunk `index`.
    pub fn chunk_len(&self, index: u64) -> EngineResult<usize> {
        if index >= self.chunk_count {
            return Err(EngineError::Corrupt(format!(
                "chunk index {index} out of range ({} chunks)",
                self.chunk_count
            )));
        }

        let len = if index == self.chunk_count - 1 { self.last_len } else { self.chunk_size };
        Ok(len as usize)
    }

    /// Allocates and loans out the buffer for chunk `index`.
    ///
    /// Each index can be acquired exactly once; the pipeline touches
    /// every chunk with one reader and one writer in sequence.
    pub fn acquire(&self, index: u64) -> EngineResult<Vec<u8>> {
        let len = self.chunk_len(index)?;
        let mut slot = self.lock_slot(index)?;

        match *slot {
            Slot::Vacant => {
                *slot = Slot::Loaned;
                Ok(vec![0u8; len])
            }
            Slot::Loaned => {
                Err(EngineError::Corrupt(format!("chunk {index} acquired while still loaned")))
            }
            Slot::Freed => Err(EngineError::Corrupt(format!("chunk {index} acquired after free"))),
        }
    }

    /// Retires chunk `index` after its bytes have been flushed.
    pub fn free(&self, index: u64) -> EngineResult<()> {
        let mut slot = self.lock_slot(index)?;

        match *slot {
            Slot::Loaned => {
                *slot = Slot::Freed;
                Ok(())
            }
            Slot::Vacant => {
                Err(EngineError::Corrupt(format!("chunk {index} freed before acquire")))
            }
            Slot::Freed => Err(EngineError::Corrupt(format!("chunk {index} freed twice"))),
        }
    }

    fn lock_slot(&self, index: u64) -> EngineResult<std::sync::MutexGuard<'_, Slot>> {
        self.slots
            .get(index as usize)
            .ok_or_else(|| {
                EngineError::Corrupt(format!(
                    "chunk index {index} out of range ({} chunks)",
                    self.chunk_count
                ))
            })?
            .lock()
            .map_err(|_| EngineError::Corrupt(format!("chunk {index} slot lock poisoned")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_math_exact_multiple() {
        let pool = ChunkPool::new(64, 16).unwrap();
        assert_eq!(pool.chunk_count(), 4);
        assert_eq!(pool.chunk_len(0).unwrap(), 16);
        assert_eq!(pool.chunk_len(3).unwrap(), 16);
    }

    #[test]
    fn test_chunk_math_with_remainder() {
        let pool = ChunkPool::new(70, 16).unwrap();
        assert_eq!(pool.chunk_count(), 5);
        assert_eq!(pool.chunk_len(4).unwrap(), 6);
    }

    #[test]
    fn test_chunk_lengths_sum_to_total() {
        for total in [0u64, 1, 15, 16, 17, 31, 32, 33, 1000] {
            let pool = ChunkPool::new(total, 16).unwrap();
            let sum: u64 = (0..pool.chunk_count()).map(|i| pool.chunk_len(i).unwrap() as u64).sum();
            assert_eq!(sum, total, "total {total}");
        }
    }

    #[test]
    fn test_zero_length_payload_has_no_chunks() {
        let pool = ChunkPool::new(0, 16).unwrap();
        assert_eq!(pool.chunk_count(), 0);
    }

    #[test]
    fn test_single_short_chunk() {
        let pool = ChunkPool::new(5, 16).unwrap();
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.chunk_len(0).unwrap(), 5);
    }

    #[test]
    fn test_rejects_odd_chunk_size() {
        assert!(matches!(ChunkPool::new(100, 7), Err(EngineError::InvalidInput(_))));
        assert!(matches!(ChunkPool::new(100, 0), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_acquire_allocates_chunk_len() {
        let pool = ChunkPool::new(20, 16).unwrap();
        assert_eq!(pool.acquire(0).unwrap().len(), 16);
        assert_eq!(pool.acquire(1).unwrap().len(), 4);
    }

    #[test]
    fn test_double_acquire_is_corrupt() {
        let pool = ChunkPool::new(20, 16).unwrap();
        let _buf = pool.acquire(0).unwrap();
        assert!(matches!(pool.acquire(0), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn test_free_lifecycle() {
        let pool = ChunkPool::new(20, 16).unwrap();
        let _buf = pool.acquire(0).unwrap();

        pool.free(0).unwrap();
        assert!(matches!(pool.free(0), Err(EngineError::Corrupt(_))));
        assert!(matches!(pool.acquire(0), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn test_free_before_acquire_is_corrupt() {
        let pool = ChunkPool::new(20, 16).unwrap();
        assert!(matches!(pool.free(1), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn test_out_of_range_index_is_corrupt() {
        let pool = ChunkPool::new(20, 16).unwrap();
        assert!(matches!(pool.chunk_len(2), Err(EngineError::Corrupt(_))));
    }
}
