//! Fixed-size cooperative worker pool over a FIFO queue.
//!
//! Workers are futures joined on the caller's task: they interleave only at
//! await points and never run in parallel, so the queue needs no locking.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;

use futures_util::future::join_all;

/// Upper bound on concurrent workers.
pub const MAX_WORKERS: usize = 10;

/// Runs `work` over every item with at most `max_workers` in flight and
/// returns the outputs in completion order.
///
/// Returns once the queue is drained and every worker has finished.
pub async fn run_pool<T, O, F, Fut>(items: Vec<T>, max_workers: usize, work: F) -> Vec<O>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = O>,
{
    let worker_count = max_workers.min(items.len());
    let capacity = items.len();
    let queue = RefCell::new(VecDeque::from(items));
    let done = RefCell::new(Vec::with_capacity(capacity));

    let workers = (0..worker_count).map(|worker| {
        let queue = &queue;
        let done = &done;
        let work = &work;
        async move {
            loop {
                // Pop in its own statement so the borrow ends before awaiting.
                let next = queue.borrow_mut().pop_front();
                let Some(item) = next else { break };
                let output = work(item).await;
                done.borrow_mut().push(output);
            }
            tracing::trace!(worker, "worker drained queue");
        }
    });
    join_all(workers).await;

    done.into_inner()
}
