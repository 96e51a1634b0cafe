use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Bounded-concurrency task pool. `submit` blocks the caller until a slot
/// is free, then spawns the task and returns immediately; `wait` joins
/// every task submitted since the last `wait` call.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Acquires a capacity permit (waiting if the pool is full) and spawns
    /// `task`. The permit is held by the spawned task, not the caller, so
    /// `submit` returns as soon as a slot was available.
    pub async fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("worker pool semaphore never closes");
        let handle = tokio::spawn(async move {
            task.await;
            drop(permit);
        });
        self.handles.lock().unwrap().push(handle);
    }

    /// Awaits every task submitted so far.
    pub async fn wait(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock().unwrap());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let pool = Arc::new(WorkerPool::new(3));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            pool.submit(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.wait().await;
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn wait_drains_completed_tasks() {
        let pool = WorkerPool::new(2);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let done = done.clone();
            pool.submit(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }
}
