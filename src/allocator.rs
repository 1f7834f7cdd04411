//! Global allocator configuration.
//!
//! Chunk processing allocates and frees one large buffer per chunk at a
//! high rate across threads; mimalloc handles that churn better than
//! the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
