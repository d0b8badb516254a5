use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicU64, Ordering},
};

use crate::device::{DeviceContext, Place};

/// How [`Fence::wait`] parks the calling thread until the fence signals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitMode {
    /// Poll the fence, yielding between checks. By the time the reclamation
    /// thread reaches a task, its fence has usually signaled already.
    #[default]
    Spin,
    /// Sleep on a condition variable until signaled.
    Block,
}

#[derive(Debug, Default)]
struct Signal {
    /// Epoch of the newest marked point.
    current: AtomicU64,
    /// Newest epoch the stream has passed.
    passed: AtomicU64,
    lock: Mutex<()>,
    done: Condvar,
}

impl Signal {
    /// Marks a new point, invalidating signals from overwritten points.
    fn mark(&self) -> u64 {
        self.current.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reports the stream passing the point marked at `epoch`.
    fn pass(&self, epoch: u64) {
        let _guard = self.lock.lock().expect("failed to lock");
        self.passed.fetch_max(epoch, Ordering::AcqRel);
        self.done.notify_all();
    }

    /// Whether the newest marked point has been passed.
    ///
    /// `passed` is read before `current`: a fresh pass may pair with a fresh
    /// mark, never with a stale one.
    fn get(&self) -> bool {
        let passed = self.passed.load(Ordering::Acquire);
        let current = self.current.load(Ordering::Acquire);
        current > 0 && passed >= current
    }

    fn wait(&self) {
        let mut guard = self.lock.lock().expect("failed to lock");
        while !self.get() {
            guard = self.done.wait(guard).expect("failed to lock");
        }
    }
}

/// A completion marker tied to a point in a context's stream.
///
/// Recording pushes the signal onto the stream behind everything submitted so
/// far; the fence flips once the stream reaches it. Re-recording moves the
/// marked point to the current stream tail, like a device event: the fence
/// reads unsignaled again until the stream passes the new point, and a signal
/// still in flight from an overwritten point is ignored.
///
/// Fences for host places never touch a stream. Host work is synchronous, so
/// [`Fence::set_finished`] signals them directly.
#[derive(Debug, Clone)]
pub struct Fence {
    place: Place,
    mode: WaitMode,
    signal: Arc<Signal>,
}

impl Fence {
    pub fn for_place(place: Place) -> Self {
        Self::with_mode(place, WaitMode::default())
    }

    pub fn with_mode(place: Place, mode: WaitMode) -> Self {
        Self {
            place,
            mode,
            signal: Default::default(),
        }
    }

    /// Records the fence at the current tail of the context's stream.
    ///
    /// No-op for host fences; they are signaled by [`Fence::set_finished`].
    pub fn record(&self, context: &DeviceContext) {
        debug_assert_eq!(self.place, context.place());
        if self.place.is_host() {
            return;
        }
        let epoch = self.signal.mark();
        let signal = self.signal.clone();
        context.submit(move || signal.pass(epoch));
    }

    /// Marks host fences finished. Device fences are signaled by their stream
    /// and ignore this.
    pub fn set_finished(&self) {
        if self.place.is_host() {
            let epoch = self.signal.mark();
            self.signal.pass(epoch);
        }
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        self.signal.get()
    }

    /// Blocks until the fence signals, per the fence's [`WaitMode`].
    pub fn wait(&self) {
        match self.mode {
            WaitMode::Spin => {
                while !self.is_signaled() {
                    std::thread::yield_now();
                }
            }
            WaitMode::Block => self.signal.wait(),
        }
    }
}
