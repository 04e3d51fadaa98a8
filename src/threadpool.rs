use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::Scope;

use crossbeam::channel::{select_biased, unbounded, Sender};

type Job<'scope> = Box<dyn FnOnce() + Send + 'scope>;

/// A small scoped worker pool used to fan parallel branch-child commits out across a
/// bounded number of threads. Two channels let urgent work (a branch commit that is
/// blocking the caller) jump ahead of background work queued behind it.
pub struct ThreadPool<'scope> {
    priority_sender: Sender<Job<'scope>>,
    nice_sender: Sender<Job<'scope>>,
    available_workers: Arc<AtomicUsize>,
    worker_count: usize,
}

impl<'scope> ThreadPool<'scope> {
    pub fn new<'env>(thread_count: usize, scope: &'scope Scope<'scope, 'env>) -> Self {
        let thread_count = thread_count.max(1);
        let (priority_sender, priority_receiver) = unbounded::<Job<'scope>>();
        let (nice_sender, nice_receiver) = unbounded::<Job<'scope>>();
        let available_workers = Arc::new(AtomicUsize::new(thread_count));

        for _ in 0..thread_count {
            let priority_receiver = priority_receiver.clone();
            let nice_receiver = nice_receiver.clone();
            let available_workers = available_workers.clone();
            scope.spawn(move || loop {
                let job = select_biased! {
                    recv(priority_receiver) -> job => job,
                    recv(nice_receiver) -> job => job,
                };
                let Ok(job) = job else { break };
                available_workers.fetch_sub(1, Ordering::SeqCst);
                job();
                available_workers.fetch_add(1, Ordering::SeqCst);
            });
        }

        Self {
            priority_sender,
            nice_sender,
            available_workers,
            worker_count: thread_count,
        }
    }

    /// Queue background work.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let _ = self.nice_sender.send(Box::new(job));
    }

    /// Queue work ahead of anything already queued via [`ThreadPool::execute`].
    pub fn execute_priority<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let _ = self.priority_sender.send(Box::new(job));
    }

    pub fn available_workers(&self) -> usize {
        self.available_workers.load(Ordering::SeqCst)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Splits `total` items into chunks sized so each available worker gets at most
    /// one chunk, never smaller than `min_chunk_size`.
    pub fn optimal_chunk_size(&self, total: usize, min_chunk_size: usize) -> usize {
        let workers = self.worker_count.max(1);
        (total / workers).max(min_chunk_size).max(1)
    }
}
