//! Progress reporting
//!
//! Uploads and downloads report byte-count deltas to a [`ProgressObserver`].
//! Multipart uploads call [`ProgressObserver::advance`] from several part
//! workers at once, so implementations must synchronise their own state.

use std::sync::atomic::{AtomicU64, Ordering};

mod color;
mod terminal;

pub use color::{
    current_colors, hex_to_ansi, set_progress_bar_colors, ColorConfig, InvalidColorError,
};
pub use terminal::TerminalProgress;

/// Receiver of transfer progress
pub trait ProgressObserver: Send + Sync {
    /// Transfer of `total_bytes` is about to begin
    fn start(&self, _total_bytes: u64) {}

    /// `bytes` more have been transferred
    fn advance(&self, bytes: u64);

    /// Transfer ended (successfully or not)
    fn finish(&self) {}
}

/// Lock-free byte accumulator
#[derive(Debug, Default)]
pub struct ByteCounter {
    total: AtomicU64,
    transferred: AtomicU64,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes reported so far
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Size announced by the last `start`
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for ByteCounter {
    fn start(&self, total_bytes: u64) {
        self.total.store(total_bytes, Ordering::Relaxed);
    }

    fn advance(&self, bytes: u64) {
        self.transferred.fetch_add(bytes, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_byte_counter_concurrent_advance() {
        let counter = Arc::new(ByteCounter::new());
        counter.start(8 * 1000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.advance(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.transferred(), 8000);
        assert_eq!(counter.total(), 8000);
    }
}
