use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::CsError;

/// Allocates the small integer identity that names a live command stream.
///
/// Ids are single bits of one shared `AtomicU32`, so up to
/// [`StreamIdAllocator::CAPACITY`] streams can be live at once per
/// allocator. Acquire and release are lock-free: the scan sets a candidate
/// bit with `fetch_or` and moves on if the bit was already held, so two
/// threads racing for the same bit cannot both win it.
///
/// Streams built with [`CommandStream::new`] share the process-wide
/// allocator from [`global`]; tests hand each stream a private instance so
/// they cannot interfere with each other.
///
/// [`CommandStream::new`]: crate::CommandStream::new
/// [`global`]: Self::global
#[derive(Debug, Default)]
pub struct StreamIdAllocator {
    used: AtomicU32,
}

impl StreamIdAllocator {
    /// Maximum number of concurrently held ids.
    pub const CAPACITY: u32 = u32::BITS;

    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide allocator.
    pub fn global() -> Arc<StreamIdAllocator> {
        static GLOBAL: OnceLock<Arc<StreamIdAllocator>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StreamIdAllocator::new())))
    }

    /// Claim the lowest free bit and return it as a guard that releases on
    /// drop. Fails with [`CsError::StreamIdsExhausted`] when every bit is
    /// held.
    pub fn acquire(self: &Arc<Self>) -> Result<StreamId, CsError> {
        let mut bit: u32 = 1;
        while bit != 0 {
            if self.used.fetch_or(bit, Ordering::AcqRel) & bit == 0 {
                return Ok(StreamId {
                    bit,
                    allocator: Arc::clone(self),
                });
            }
            bit <<= 1;
        }
        Err(CsError::StreamIdsExhausted {
            capacity: Self::CAPACITY,
        })
    }

    fn release(&self, bit: u32) {
        self.used.fetch_and(!bit, Ordering::AcqRel);
    }
}

/// One held stream identity; the bit returns to its allocator on drop.
#[derive(Debug)]
pub struct StreamId {
    bit: u32,
    allocator: Arc<StreamIdAllocator>,
}

impl StreamId {
    /// The id value: the held bit itself (1, 2, 4, ...), unique among
    /// concurrently live streams of the same allocator.
    pub fn value(&self) -> u32 {
        self.bit
    }
}

impl Drop for StreamId {
    fn drop(&mut self) {
        self.allocator.release(self.bit);
    }
}
