//! Per-file stream ownership and the ordered writer.
//!
//! A [`FileHandler`] owns one operation's source and destination files
//! for its whole lifetime: opened together, streamed (tag first, then
//! chunks), drained by a single writer thread, and closed on drop.
//!
//! Source reads are strictly sequential under one lock: the tag and
//! every chunk come off the stream in order. Writes are the interesting
//! part: transform workers finish in arbitrary order, so completed
//! chunks are queued over a bounded channel and the writer thread feeds
//! them through an [`OrderedQueue`], flushing to the destination in
//! strict chunk-index order and retiring each buffer as it lands.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use flume::Sender;

use crate::cipher::tag::IntegrityTag;
use crate::config::TAG_SIZE;
use crate::error::{EngineError, EngineResult};
use crate::status::StatusListener;
use crate::types::{ProcessorMode, Task};
use crate::worker::order::OrderedQueue;
use crate::worker::pool::ChunkPool;

/// Running writer thread; resolved by [`FileHandler::wrap_up`].
pub struct WriterHandle {
    handle: JoinHandle<EngineResult<()>>,
}

pub struct FileHandler {
    source: Mutex<File>,
    dest: Mutex<Option<File>>,
    pool: Arc<ChunkPool>,
    writeback: Mutex<Option<Sender<Task>>>,
}

impl FileHandler {
    /// Opens both streams and sizes the chunk pool to the payload.
    ///
    /// When decrypting, the payload is the source length minus the
    /// integrity tag at the head.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] when either file cannot be opened or the
    /// source is a directory; [`EngineError::InvalidInput`] when a
    /// ciphertext is too short to contain a tag.
    pub fn open(src: &Path, dest: &Path, mode: ProcessorMode, chunk_size: u64) -> EngineResult<Self> {
        let metadata = std::fs::metadata(src)?;
        if metadata.is_dir() {
            return Err(EngineError::Io(std::io::Error::other(format!(
                "source is a directory: {}",
                src.display()
            ))));
        }

        let payload_len = match mode {
            ProcessorMode::Encrypt => metadata.len(),
            ProcessorMode::Decrypt => {
                metadata.len().checked_sub(TAG_SIZE as u64).ok_or_else(|| {
                    EngineError::InvalidInput(format!(
                        "{} is too short to contain an integrity tag",
                        src.display()
                    ))
                })?
            }
        };

        let source = File::open(src)?;
        let dest_file = OpenOptions::new().write(true).create(true).truncate(true).open(dest)?;
        let pool = Arc::new(ChunkPool::new(payload_len, chunk_size)?);

        Ok(Self {
            source: Mutex::new(source),
            dest: Mutex::new(Some(dest_file)),
            pool,
            writeback: Mutex::new(None),
        })
    }

    #[inline]
    pub fn chunk_count(&self) -> u64 {
        self.pool.chunk_count()
    }

    #[inline]
    pub fn payload_len(&self) -> u64 {
        self.pool.total_len()
    }

    /// Reads the integrity tag from the head of the source.
    pub fn read_tag(&self) -> EngineResult<[u8; TAG_SIZE]> {
        let mut source = self.lock_source()?;
        let mut tag = [0u8; TAG_SIZE];
        source.read_exact(&mut tag)?;
        Ok(tag)
    }

    /// Writes the integrity tag at the head of the destination.
    ///
    /// Must happen before the writer thread takes the stream.
    pub fn write_tag(&self, tag: &IntegrityTag) -> EngineResult<()> {
        let mut dest = self.lock_dest()?;
        let file = dest
            .as_mut()
            .ok_or_else(|| EngineError::Corrupt("tag write after writer dispatch".into()))?;
        file.write_all(tag.as_bytes())?;
        Ok(())
    }

    /// Reads chunk `index` into a pool buffer.
    ///
    /// Chunks are requested in increasing order, so each call continues
    /// the sequential scan of the source stream.
    pub fn read_chunk(&self, index: u64) -> EngineResult<Vec<u8>> {
        let mut buf = self.pool.acquire(index)?;
        let mut source = self.lock_source()?;
        source.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Spawns the single ordered-writeback thread.
    ///
    /// The thread owns the destination stream from here on. It drains
    /// the bounded writeback channel through a reordering queue and
    /// writes chunks in strict index order, freeing each buffer after
    /// its write. It finishes once every chunk has been flushed, or
    /// fails if the channel closes early or the destination errors.
    pub fn start_writer(
        &self,
        capacity: usize,
        listener: Arc<dyn StatusListener>,
    ) -> EngineResult<WriterHandle> {
        let dest = self
            .lock_dest()?
            .take()
            .ok_or_else(|| EngineError::Corrupt("writer dispatched twice".into()))?;

        let (tx, rx) = flume::bounded::<Task>(capacity);
        *self
            .writeback
            .lock()
            .map_err(|_| EngineError::Corrupt("writeback lock poisoned".into()))? = Some(tx);

        let pool = Arc::clone(&self.pool);
        let total = pool.chunk_count();

        let handle = thread::Builder::new()
            .name("chunk-writer".into())
            .spawn(move || -> EngineResult<()> {
                let mut writer = BufWriter::new(dest);
                let mut queue = OrderedQueue::new(0);
                let mut written = 0u64;

                while written < total {
                    let Ok(task) = rx.recv() else {
                        return Err(EngineError::Corrupt(format!(
                            "writeback channel closed with {written}/{total} chunks flushed"
                        )));
                    };

                    for (index, data) in queue.add(task.index, task.data) {
                        writer.write_all(&data)?;
                        drop(data);
                        pool.free(index)?;

                        written += 1;
                        listener.on_progress("Writing chunks", written, total);
                    }
                }

                writer.flush()?;
                Ok(())
            })
            .map_err(EngineError::Io)?;

        Ok(WriterHandle { handle })
    }

    /// Queues a transformed chunk for ordered writeback.
    ///
    /// Called by transform workers; fails once the writer has stopped
    /// accepting chunks (its own error surfaces from [`Self::wrap_up`]).
    pub fn queue_chunk(&self, index: u64, data: Vec<u8>) -> EngineResult<()> {
        let tx = self
            .writeback
            .lock()
            .map_err(|_| EngineError::Corrupt("writeback lock poisoned".into()))?
            .clone()
            .ok_or_else(|| EngineError::Corrupt("chunk queued before writer dispatch".into()))?;

        tx.send(Task { data, index })
            .map_err(|_| EngineError::Corrupt(format!("writer rejected chunk {index}")))
    }

    /// Closes the writeback channel, waits for the writer to drain, and
    /// releases both streams.
    pub fn wrap_up(&self, writer: WriterHandle) -> EngineResult<()> {
        // Dropping the sender lets the writer observe the end of input
        // if it has not seen every chunk yet.
        self.writeback
            .lock()
            .map_err(|_| EngineError::Corrupt("writeback lock poisoned".into()))?
            .take();

        writer
            .handle
            .join()
            .map_err(|_| EngineError::Corrupt("writer thread panicked".into()))?
        // Source and destination close on drop; the destination was
        // flushed by the writer before it returned.
    }

    fn lock_source(&self) -> EngineResult<std::sync::MutexGuard<'_, File>> {
        self.source.lock().map_err(|_| EngineError::Corrupt("source lock poisoned".into()))
    }

    fn lock_dest(&self) -> EngineResult<std::sync::MutexGuard<'_, Option<File>>> {
        self.dest.lock().map_err(|_| EngineError::Corrupt("dest lock poisoned".into()))
    }
}
