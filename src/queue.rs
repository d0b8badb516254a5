use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single-threaded work queue executing submitted closures in submission
/// order on a dedicated background thread.
///
/// Dropping the queue stops accepting new work, lets the worker drain every
/// closure still in the channel, and joins the thread before returning.
#[derive(Debug)]
pub struct WorkQueue {
    sender: Option<flume::Sender<Task>>,
    worker: Option<JoinHandle<()>>,
}

impl WorkQueue {
    /// Spawns the queue's worker thread under the given name.
    pub fn single_thread(name: impl Into<String>) -> Self {
        let (sender, receiver) = flume::unbounded::<Task>();
        let worker = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    task();
                }
            })
            .expect("failed to spawn worker thread");
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Submits a closure to run after everything submitted before it.
    /// Fire-and-forget: the caller never observes the task's completion.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            _ = sender.send(Box::new(task));
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        // Disconnecting the channel lets the worker observe shutdown only
        // after it has received every queued task.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            _ = worker.join();
        }
    }
}
