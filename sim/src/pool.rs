//! Fixed-size worker pool shared by every parallel phase of a session.
//!
//! ## Execution Model
//!
//! A phase hands the pool a work list length (or a mutable slice) and a batch
//! task. The pool partitions the list with [`partition`], runs one task per
//! batch on its workers, and blocks until every batch has finished. Results
//! come back as one value per batch for the caller to merge.
//!
//! ## Failure Policy
//!
//! A batch task that panics is logged at `error!`, counted, and replaced by
//! its type's default (empty) result. The frame continues without it.
//!
//! ## Lifecycle
//!
//! The pool is built once per session and torn down with [`WorkerPool::shutdown`],
//! which waits a bounded time for workers to exit and abandons any stragglers.

use crate::error::SimError;
use crate::partition::{partition, split_disjoint_mut};
use crossbeam::channel::{unbounded, Receiver};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Long-lived pool of simulation workers.
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
    /// One message per worker thread as it exits.
    exits: Receiver<usize>,
    failed_batches: AtomicU64,
}

impl WorkerPool {
    /// Build a pool with exactly `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self, SimError> {
        let threads = threads.max(1);
        let (exit_tx, exits) = unbounded();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sim-worker-{i}"))
            .exit_handler(move |index| {
                let _ = exit_tx.send(index);
            })
            .build()?;

        log::info!("worker pool started with {} threads", threads);

        Ok(Self {
            pool,
            threads,
            exits,
            failed_batches: AtomicU64::new(0),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Total number of batch tasks that failed since the pool was built.
    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Relaxed)
    }

    /// Run `task` once per batch of `[0, len)` and return the batch results.
    ///
    /// An empty work list submits nothing and returns no results.
    pub fn run_batches<R, F>(&self, phase: &'static str, len: usize, task: F) -> Vec<R>
    where
        R: Send + Default,
        F: Fn(Range<usize>) -> R + Sync,
    {
        let ranges = partition(len, self.threads);
        if ranges.is_empty() {
            return Vec::new();
        }
        log::trace!("{}: {} items in {} batches", phase, len, ranges.len());

        self.pool.install(|| {
            ranges
                .into_par_iter()
                .map(|range| self.guarded(phase, &range, || task(range.clone())))
                .collect()
        })
    }

    /// Run `task` over disjoint mutable batches of `items`.
    ///
    /// Each task receives exclusive access to its own sub-slice plus the
    /// range that sub-slice covers in `items`.
    pub fn run_batches_mut<T, R, F>(&self, phase: &'static str, items: &mut [T], task: F) -> Vec<R>
    where
        T: Send,
        R: Send + Default,
        F: Fn(Range<usize>, &mut [T]) -> R + Sync,
    {
        let ranges = partition(items.len(), self.threads);
        if ranges.is_empty() {
            return Vec::new();
        }
        log::trace!("{}: {} items in {} batches", phase, items.len(), ranges.len());

        let slices = split_disjoint_mut(items, &ranges);
        self.pool.install(|| {
            slices
                .into_par_iter()
                .zip(ranges.into_par_iter())
                .map(|(slice, range)| self.guarded(phase, &range, || task(range.clone(), slice)))
                .collect()
        })
    }

    fn guarded<R: Default>(&self, phase: &'static str, range: &Range<usize>, f: impl FnOnce() -> R) -> R {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => {
                self.failed_batches.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "{}: batch {:?} failed ({}); its results are dropped for this frame",
                    phase,
                    range,
                    panic_message(payload.as_ref())
                );
                R::default()
            }
        }
    }

    /// Stop the pool, waiting up to `grace` for every worker to exit.
    ///
    /// Workers still running after the grace period are detached and an
    /// error reports how many were left behind.
    pub fn shutdown(self, grace: Duration) -> Result<(), SimError> {
        let WorkerPool { pool, threads, exits, .. } = self;
        drop(pool);

        let deadline = Instant::now() + grace;
        let mut exited = 0;
        while exited < threads {
            match exits.recv_deadline(deadline) {
                Ok(_) => exited += 1,
                Err(_) => break,
            }
        }

        if exited < threads {
            let remaining = threads - exited;
            log::warn!("worker pool shutdown timed out with {} worker(s) still running", remaining);
            return Err(SimError::ShutdownTimeout { remaining, grace });
        }
        log::info!("worker pool stopped");
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
