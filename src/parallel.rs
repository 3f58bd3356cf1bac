//! Bounded worker pool for per-entry work on `add` and `extract`.
//!
//! Workers are plain OS threads scoped to a single call via
//! `std::thread::scope` — nothing outlives the call that spawned it. The job
//! queue is a bounded multi-consumer channel (`crossbeam-channel`, since
//! `std::sync::mpsc::Receiver` can't be cloned across more than one worker)
//! so a burst of large source files can't be buffered past `4 * workers`
//! pending jobs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::consts::{MAX_WORKERS, MIN_WORKERS};
use crate::error::VaultError;

/// Progress hook: `(entries_done, bytes_done, current_path)`. Must tolerate
/// being called concurrently from any worker thread.
pub type ProgressFn<'a> = dyn Fn(u64, u64, &str) + Send + Sync + 'a;

/// Cooperative cancellation flag shared between the orchestrator and every
/// worker. Workers check it between entries, never mid-read.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolve a caller-supplied worker count, defaulting to
/// `min(2*CPU, 16)` and always clamped to `[1, 16]`.
pub fn resolve_worker_count(requested: Option<usize>) -> usize {
    let n = requested.unwrap_or_else(|| 2 * num_cpus::get());
    n.clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Run `work` over every item in `items` using `workers` OS threads.
///
/// Results are returned in the original submission order regardless of
/// completion order. `label` and `item_bytes`
/// extract a display path and a byte count from each item purely for the
/// progress callback; they don't influence scheduling.
#[allow(clippy::too_many_arguments)]
pub fn run_indexed<T, R>(
    items: Vec<T>,
    workers: usize,
    cancel: &CancelFlag,
    progress: Option<&ProgressFn<'_>>,
    label: impl Fn(&T) -> String + Sync,
    item_bytes: impl Fn(&T) -> u64 + Sync,
    work: impl Fn(&T) -> Result<R, VaultError> + Sync,
) -> Vec<Result<R, VaultError>>
where
    T: Send,
    R: Send,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.max(1).min(total);
    let queue_capacity = (4 * workers).max(1);

    let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, T)>(queue_capacity);
    let (res_tx, res_rx) = crossbeam_channel::unbounded::<(usize, Result<R, VaultError>)>();

    let entries_done = AtomicU64::new(0);
    let bytes_done = AtomicU64::new(0);

    std::thread::scope(|scope| {
        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            let cancel = cancel.clone();
            let work = &work;
            let label = &label;
            let item_bytes = &item_bytes;
            let entries_done = &entries_done;
            let bytes_done = &bytes_done;
            let progress = progress;

            scope.spawn(move || {
                log::debug!("parallel worker {worker_id} started");
                while let Ok((idx, item)) = job_rx.recv() {
                    if cancel.is_cancelled() {
                        let _ = res_tx.send((idx, Err(VaultError::Cancelled)));
                        continue;
                    }

                    let path_label = label(&item);
                    let result = work(&item);
                    let n_bytes = item_bytes(&item);

                    let done = entries_done.fetch_add(1, Ordering::SeqCst) + 1;
                    let total_bytes = bytes_done.fetch_add(n_bytes, Ordering::SeqCst) + n_bytes;
                    if let Some(cb) = progress {
                        cb(done, total_bytes, &path_label);
                    }

                    if res_tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(res_tx);
        drop(job_rx);

        scope.spawn(move || {
            for (idx, item) in items.into_iter().enumerate() {
                if job_tx.send((idx, item)).is_err() {
                    break;
                }
            }
        });

        let mut slots: Vec<Option<Result<R, VaultError>>> = (0..total).map(|_| None).collect();
        for (idx, result) in res_rx.iter() {
            slots[idx] = Some(result);
        }
        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(VaultError::Cancelled)))
            .collect()
    })
}
