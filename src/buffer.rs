//! # Scratch Buffer Pool

use parking_lot::Mutex;

/// Capacity a recycled buffer may keep.
pub const RETAINED_CAPACITY: usize = 1024;

/// Number of idle buffers kept around.
const MAX_POOLED: usize = 16;

/// A small pool of reusable `String` buffers used to assemble log lines.
///
/// Rendering a line needs a scratch buffer; taking one from the pool avoids an
/// allocation on every call. Buffers are cleared when they come back and any
/// capacity beyond [`RETAINED_CAPACITY`] is released, so a single huge
/// message cannot pin memory for the rest of the process.
#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: Mutex<Vec<String>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a cleared buffer from the pool, or allocates a new one.
    pub fn take(&self) -> String {
        self.buffers
            .lock()
            .pop()
            .unwrap_or_else(|| String::with_capacity(RETAINED_CAPACITY))
    }

    /// Returns a buffer to the pool.
    pub fn recycle(&self, mut buffer: String) {
        buffer.clear();
        if buffer.capacity() > RETAINED_CAPACITY {
            buffer.shrink_to(RETAINED_CAPACITY);
        }

        let mut buffers = self.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buffer);
        }
    }

    /// Number of idle buffers currently pooled.
    pub fn idle(&self) -> usize {
        self.buffers.lock().len()
    }
}
