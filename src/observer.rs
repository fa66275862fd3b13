//! Batch outcome accounting.
//!
//! The host pipeline reports these counts onward. `Counters` is a plain
//! in-process implementation, cheap to share between clients behind an
//! `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives per-batch outcome counts.
pub trait Observer {
    /// A batch of `n` records was handed to the output
    fn new_batch(&self, n: usize);
    /// `n` records could not be encoded and will never be delivered
    fn dropped(&self, n: usize);
    /// `n` points were accepted by the store
    fn acked(&self, n: usize);
    /// `n` records were rejected by the store and returned for retry
    fn failed(&self, n: usize);
}

impl<O> Observer for Arc<O>
where
    O: Observer + ?Sized,
{
    fn new_batch(&self, n: usize) {
        (**self).new_batch(n)
    }

    fn dropped(&self, n: usize) {
        (**self).dropped(n)
    }

    fn acked(&self, n: usize) {
        (**self).acked(n)
    }

    fn failed(&self, n: usize) {
        (**self).failed(n)
    }
}

/// Running totals of every count reported to it.
#[derive(Debug, Default)]
pub struct Counters {
    batches: AtomicUsize,
    events: AtomicUsize,
    dropped: AtomicUsize,
    acked: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    /// Create a zeroed Counters
    pub fn new() -> Counters {
        Counters::default()
    }

    /// Total batches handed to the output
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    /// Total records across all batches
    pub fn events(&self) -> usize {
        self.events.load(Ordering::Relaxed)
    }

    /// Total records dropped as unencodable
    pub fn dropped_total(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Total points accepted by the store
    pub fn acked_total(&self) -> usize {
        self.acked.load(Ordering::Relaxed)
    }

    /// Total records returned for retry
    pub fn failed_total(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Observer for Counters {
    fn new_batch(&self, n: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.events.fetch_add(n, Ordering::Relaxed);
    }

    fn dropped(&self, n: usize) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    fn acked(&self, n: usize) {
        self.acked.fetch_add(n, Ordering::Relaxed);
    }

    fn failed(&self, n: usize) {
        self.failed.fetch_add(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn counters_accumulate_across_batches() {
        let counters = Counters::new();
        counters.new_batch(10);
        counters.dropped(3);
        counters.acked(7);
        counters.new_batch(5);
        counters.dropped(0);
        counters.failed(5);

        assert_eq!(counters.batches(), 2);
        assert_eq!(counters.events(), 15);
        assert_eq!(counters.dropped_total(), 3);
        assert_eq!(counters.acked_total(), 7);
        assert_eq!(counters.failed_total(), 5);
    }

    #[test]
    fn counters_shared_between_threads() {
        let counters = Arc::new(Counters::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..100 {
                        c.new_batch(2);
                        c.acked(2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counters.batches(), 400);
        assert_eq!(counters.acked_total(), 800);
    }
}
