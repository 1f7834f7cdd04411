//! Per-file orchestration.
//!
//! [`Processor`] drives one file at a time through the pipeline: derive
//! the cipher material once, settle the integrity tag (written on
//! encrypt, verified on decrypt before anything else is trusted), then
//! stream chunks through three stages (a sequential reader thread, the
//! rayon transform pool, and the handler's ordered writer) and finish
//! with a timing report and optional source deletion.
//!
//! Failure semantics: files that cannot be opened are skipped
//! (`Ok(false)`), a tag mismatch removes the destination and surfaces
//! [`EngineError::WrongKey`], and any I/O failure mid-stream aborts this
//! file only.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use bytesize::ByteSize;
use rayon::iter::{ParallelBridge, ParallelIterator};
use tracing::{debug, warn};

use crate::cipher::Cipher;
use crate::config::{CHANNEL_DEPTH, CHUNK_SIZE};
use crate::error::{EngineError, EngineResult};
use crate::secret::SecretBytes;
use crate::status::StatusListener;
use crate::types::{Processing, Task};
use crate::worker::handler::FileHandler;

pub struct Processor {
    cipher: Arc<Cipher>,
    chunk_size: u64,
    concurrency: usize,
}

impl Processor {
    /// Builds a processor with the default 64 MiB chunk size.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInput`] for a key below the minimum length.
    pub fn new(key: SecretBytes) -> EngineResult<Self> {
        Self::with_chunk_size(key, CHUNK_SIZE)
    }

    /// Builds a processor with an explicit chunk size.
    ///
    /// The size must be even: pairing restarts at each chunk boundary
    /// and both directions must split the payload identically.
    pub fn with_chunk_size(key: SecretBytes, chunk_size: u64) -> EngineResult<Self> {
        if chunk_size == 0 || chunk_size & 1 == 1 {
            return Err(EngineError::InvalidInput(format!(
                "chunk size must be non-zero and even, got {chunk_size}"
            )));
        }

        let cipher = Arc::new(Cipher::new(key)?);
        let concurrency = thread::available_parallelism().map(|p| p.get()).unwrap_or(4);

        Ok(Self { cipher, chunk_size, concurrency })
    }

    /// Encrypts `src` into `dest`.
    ///
    /// Returns `Ok(false)` when the files cannot be opened; the source
    /// is deleted afterward unless `preserve_source` is set.
    pub fn encrypt_file(
        &self,
        preserve_source: bool,
        src: &Path,
        dest: &Path,
        listener: &Arc<dyn StatusListener>,
    ) -> EngineResult<bool> {
        self.process_file(Processing::Encryption, preserve_source, src, dest, listener)
    }

    /// Decrypts `src` into `dest`.
    ///
    /// # Errors
    ///
    /// [`EngineError::WrongKey`] when the stored tag does not match the
    /// key; the partially-created destination is removed first.
    pub fn decrypt_file(
        &self,
        preserve_source: bool,
        src: &Path,
        dest: &Path,
        listener: &Arc<dyn StatusListener>,
    ) -> EngineResult<bool> {
        self.process_file(Processing::Decryption, preserve_source, src, dest, listener)
    }

    fn process_file(
        &self,
        mode: Processing,
        preserve_source: bool,
        src: &Path,
        dest: &Path,
        listener: &Arc<dyn StatusListener>,
    ) -> EngineResult<bool> {
        let handler = match FileHandler::open(src, dest, mode.mode(), self.chunk_size) {
            Ok(handler) => Arc::new(handler),
            Err(err) => {
                warn!(file = %src.display(), error = %err, "cannot open");
                listener.on_status(&format!("skipping {}: {err}", src.display()));
                return Ok(false);
            }
        };

        // Settle the tag before any payload byte moves. A wrong key must
        // fail here, cheaply, and leave no destination behind.
        match mode {
            Processing::Encryption => {
                let tag = self.cipher.tag()?;
                handler.write_tag(&tag)?;
            }
            Processing::Decryption => {
                let stored = handler.read_tag()?;
                let expected = self.cipher.tag()?;
                if let Err(err) = expected.verify(&stored) {
                    debug!(
                        stored = %hex::encode(stored),
                        expected = %hex::encode(expected.as_bytes()),
                        "integrity tag mismatch"
                    );
                    drop(handler);
                    if let Err(rm) = fs::remove_file(dest) {
                        warn!(file = %dest.display(), error = %rm, "cannot remove destination");
                    }
                    return Err(err);
                }
            }
        }

        let total_chunks = handler.chunk_count();
        let payload_len = handler.payload_len();
        let capacity = self.concurrency * CHANNEL_DEPTH;

        listener.on_status(&format!("{} {}", mode.label(), src.display()));
        listener.on_progress("Processing chunks", 0, total_chunks);

        let writer = handler.start_writer(capacity, Arc::clone(listener))?;
        let (task_tx, task_rx) = flume::bounded::<Task>(capacity);

        let progress = Arc::new(AtomicU64::new(0));
        let read_millis = Arc::new(AtomicU64::new(0));
        let failed: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));
        let started = Instant::now();

        let reader = thread::Builder::new().name("chunk-reader".into()).spawn({
            let handler = Arc::clone(&handler);
            let read_millis = Arc::clone(&read_millis);
            let failed = Arc::clone(&failed);

            move || -> EngineResult<()> {
                for index in 0..total_chunks {
                    // Stop submitting once a later stage has failed.
                    if failed.lock().map(|f| f.is_some()).unwrap_or(true) {
                        break;
                    }

                    let read_start = Instant::now();
                    let data = handler.read_chunk(index)?;
                    read_millis
                        .fetch_add(read_start.elapsed().as_millis() as u64, Ordering::Relaxed);

                    if task_tx.send(Task { data, index }).is_err() {
                        break;
                    }
                }
                Ok(())
            }
        })?;

        let executor = thread::Builder::new().name("chunk-executor".into()).spawn({
            let handler = Arc::clone(&handler);
            let cipher = Arc::clone(&self.cipher);
            let progress = Arc::clone(&progress);
            let failed = Arc::clone(&failed);
            let listener = Arc::clone(listener);

            move || {
                task_rx.into_iter().par_bridge().for_each(|mut task| {
                    if failed.lock().map(|f| f.is_some()).unwrap_or(true) {
                        return;
                    }

                    cipher.apply(mode, &mut task.data);

                    let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                    listener.on_progress("Processing chunks", done, total_chunks);

                    if let Err(err) = handler.queue_chunk(task.index, task.data) {
                        if let Ok(mut slot) = failed.lock() {
                            slot.get_or_insert(err);
                        }
                    }
                });
            }
        })?;

        let read_result =
            reader.join().map_err(|_| EngineError::Corrupt("reader thread panicked".into()))?;
        executor.join().map_err(|_| EngineError::Corrupt("executor thread panicked".into()))?;

        // The writer must always be resolved, even on the abort path;
        // its error is only authoritative when the stages upstream were
        // clean.
        let wrap_result = handler.wrap_up(writer);
        read_result?;
        if let Some(err) = failed.lock().ok().and_then(|mut slot| slot.take()) {
            return Err(err);
        }
        wrap_result?;

        report_timing(payload_len, started.elapsed().as_millis() as u64, &read_millis, listener);

        if !preserve_source {
            if let Err(err) = fs::remove_file(src) {
                warn!(file = %src.display(), error = %err, "cannot delete source");
                listener.on_status(&format!("could not delete source {}", src.display()));
            }
        }

        Ok(true)
    }
}

fn report_timing(
    payload_len: u64,
    total_millis: u64,
    read_millis: &AtomicU64,
    listener: &Arc<dyn StatusListener>,
) {
    let read = read_millis.load(Ordering::Relaxed);
    let process = total_millis.saturating_sub(read);
    let per_second = payload_len as f64 / (process.max(1) as f64 / 1000.0);

    listener.on_status(&format!("File size        = {}", ByteSize::b(payload_len)));
    listener.on_status(&format!("Time taken       = {total_millis} ms"));
    listener.on_status(&format!(" `- Read time    = {read} ms"));
    listener.on_status(&format!(" `- Process time = {process} ms"));
    listener.on_status(&format!("Average speed    = {}/s", ByteSize::b(per_second as u64)));
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::config::TAG_SIZE;
    use crate::status::Silent;

    fn listener() -> Arc<dyn StatusListener> {
        Arc::new(Silent)
    }

    fn processor(key: &[u8]) -> Processor {
        // Tiny chunks so small fixtures still exercise multi-chunk
        // reading, parallel transform, and ordered writeback.
        Processor::with_chunk_size(SecretBytes::new(key), 16).unwrap()
    }

    #[test]
    fn test_file_roundtrip_multichunk() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.bin");
        let enc = dir.path().join("plain.bin.xrv");
        let dec = dir.path().join("restored.bin");

        // Five full chunks plus an odd tail.
        let payload: Vec<u8> = (0..=83u8).cycle().take(1013).collect();
        fs::write(&src, &payload).unwrap();

        let processor = processor(b"secret_key");
        assert!(processor.encrypt_file(true, &src, &enc, &listener()).unwrap());
        assert_eq!(fs::metadata(&enc).unwrap().len(), payload.len() as u64 + TAG_SIZE as u64);
        assert_ne!(&fs::read(&enc).unwrap()[TAG_SIZE..], payload.as_slice());

        assert!(processor.decrypt_file(true, &enc, &dec, &listener()).unwrap());
        assert_eq!(fs::read(&dec).unwrap(), payload);
    }

    #[test]
    fn test_empty_file_roundtrip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty.bin");
        let enc = dir.path().join("empty.bin.xrv");
        let dec = dir.path().join("empty.out");
        fs::write(&src, b"").unwrap();

        let processor = processor(b"secret_key");
        assert!(processor.encrypt_file(true, &src, &enc, &listener()).unwrap());
        assert_eq!(fs::metadata(&enc).unwrap().len(), TAG_SIZE as u64);

        assert!(processor.decrypt_file(true, &enc, &dec, &listener()).unwrap());
        assert_eq!(fs::metadata(&dec).unwrap().len(), 0);
    }

    #[test]
    fn test_wrong_key_removes_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.bin");
        let enc = dir.path().join("plain.bin.xrv");
        let dec = dir.path().join("restored.bin");
        fs::write(&src, b"some moderately secret bytes").unwrap();

        processor(b"secret_key").encrypt_file(true, &src, &enc, &listener()).unwrap();

        let result = processor(b"not_that_key").decrypt_file(true, &enc, &dec, &listener());
        assert!(matches!(result, Err(EngineError::WrongKey)));
        assert!(!dec.exists());
        assert!(enc.exists());
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("nope.bin");
        let dest = dir.path().join("out.bin");

        let ok = processor(b"secret_key").encrypt_file(true, &src, &dest, &listener()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_source_deleted_unless_preserved() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.bin");
        let enc = dir.path().join("plain.bin.xrv");
        fs::write(&src, b"delete me after").unwrap();

        processor(b"secret_key").encrypt_file(false, &src, &enc, &listener()).unwrap();
        assert!(!src.exists());
        assert!(enc.exists());
    }

    #[test]
    fn test_rejects_short_key() {
        let result = Processor::new(SecretBytes::new(b"12345"));
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_odd_chunk_size() {
        let result = Processor::with_chunk_size(SecretBytes::new(b"secret_key"), 15);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }
}
