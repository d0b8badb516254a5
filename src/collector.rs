use std::sync::Mutex;

use crate::device::DeviceContext;
use crate::fence::{Fence, WaitMode};
use crate::garbage::{Garbage, PendingBatch};
use crate::instruction::Instruction;
use crate::queue::WorkQueue;
use crate::tensor::DenseTensor;
use crate::variable::Variable;

#[derive(Debug, Clone)]
struct OpFence {
    context: DeviceContext,
    fence: Fence,
}

/// Deferred garbage collector for asynchronously executed tensor programs.
///
/// Detaching a buffer from its variable happens synchronously on the calling
/// thread, so the program can rebind the variable right away. The buffer
/// itself is only dropped on a background reclamation thread, once a
/// completion fence proves the owning operation's device work has finished.
///
/// `max_memory_size` selects the regime:
/// - negative: collection disabled, adding a variable changes nothing
/// - 0 or 1: every buffer is freed individually, right behind its fence
/// - above 1: buffers accumulate and flush together once their total size
///   reaches the threshold
#[derive(Debug)]
pub struct EventGarbageCollector {
    /// Runs the deferred frees; declared first so pending reclamation drains
    /// before the fence table drops.
    queue: WorkQueue,
    /// Byte threshold; also encodes the disabled and immediate regimes.
    max_memory_size: i64,
    /// Completion fences indexed by operation ordinal.
    slots: Vec<OpFence>,
    /// Garbage accumulated since the last flush.
    batch: Mutex<PendingBatch>,
}

impl EventGarbageCollector {
    /// Builds a collector with one completion fence per scheduled operation.
    pub fn new(instructions: &[Instruction], max_memory_size: i64) -> Self {
        Self::with_wait_mode(instructions, max_memory_size, WaitMode::default())
    }

    pub fn with_wait_mode(
        instructions: &[Instruction],
        max_memory_size: i64,
        mode: WaitMode,
    ) -> Self {
        let queue = WorkQueue::single_thread("garbage-collector");
        let slots = instructions
            .iter()
            .enumerate()
            .map(|(id, instruction)| {
                debug_assert_eq!(id, instruction.id());
                let context = instruction.context().clone();
                let fence = Fence::with_mode(context.place(), mode);
                OpFence { context, fence }
            })
            .collect::<Vec<_>>();
        log::debug!(
            "collector armed with {} completion fences, threshold {max_memory_size} bytes",
            slots.len()
        );
        Self {
            queue,
            max_memory_size,
            slots,
            batch: Mutex::new(PendingBatch::default()),
        }
    }

    /// Collects the buffers of `var` once `instruction`'s device work is done.
    pub fn add(&self, var: &mut Variable, instruction: &Instruction) {
        self.add_at(var, instruction.id());
    }

    /// Collects the buffers of `var` once the device work of the operation at
    /// ordinal `op` is done.
    ///
    /// The variable itself stays behind, detached: dense tensors keep shape
    /// and type but lose their buffer, sparse tensors additionally drop their
    /// row index, arrays detach every element. Variables whose lifetime is
    /// not tied to one operation (scopes, feed queues, rank tables) are left
    /// untouched.
    ///
    /// Panics if `op` was not scheduled or if the variable kind holds device
    /// memory this collector does not know how to reclaim.
    pub fn add_at(&self, var: &mut Variable, op: usize) {
        assert!(
            op < self.slots.len(),
            "operation ordinal {op} exceeds the {} scheduled completion fences",
            self.slots.len()
        );
        if self.max_memory_size < 0 {
            return;
        }
        let OpFence { context, fence } = &self.slots[op];
        match var {
            Variable::Dense(tensor) => self.collect(detach(tensor), context, fence),
            Variable::Sparse(sparse) => {
                sparse.rows.clear();
                self.collect(detach(&mut sparse.value), context, fence);
            }
            Variable::Array(array) => {
                for tensor in array.iter_mut() {
                    self.collect(detach(tensor), context, fence);
                }
            }
            // scopes belong to the program, not to the operation
            Variable::Scopes(_) => {}
            // feed queues and rank tables outlive the step that filled them
            Variable::FeedQueue(_) | Variable::RankTable(_) => {}
            other => panic!(
                "variable kind {} is not supported by eager deletion",
                other.kind()
            ),
        }
    }

    fn collect(&self, garbage: Option<Garbage>, context: &DeviceContext, fence: &Fence) {
        let Some(garbage) = garbage else {
            return;
        };
        if self.max_memory_size <= 1 {
            return self.free(garbage, context, fence);
        }
        let mut batch = self.batch.lock().expect("failed to lock");
        batch.push(garbage, context, fence);
        if batch.bytes() as i64 >= self.max_memory_size {
            self.flush(batch.take());
        }
    }

    /// Frees one buffer right behind its operation's fence.
    fn free(&self, garbage: Garbage, context: &DeviceContext, fence: &Fence) {
        fence.record(context);
        fence.set_finished();
        log::trace!("reclaiming {} bytes on {}", garbage.size(), garbage.place());

        let fence = fence.clone();
        self.queue.submit(move || {
            fence.wait();
            drop(garbage);
        });
    }

    /// Arms the newest fence of every context in the batch and hands the
    /// batch to the reclamation thread.
    fn flush(&self, batch: PendingBatch) {
        let bytes = batch.bytes();
        let count = batch.len();
        let (garbages, latest) = batch.into_parts();
        let fences = latest
            .into_values()
            .map(|(context, fence)| {
                fence.record(&context);
                fence.set_finished();
                fence
            })
            .collect::<Vec<_>>();
        log::debug!(
            "flushing {count} buffers of {bytes} bytes behind {} fences",
            fences.len()
        );

        self.queue.submit(move || {
            for fence in &fences {
                fence.wait();
            }
            drop(garbages);
        });
    }
}

impl Drop for EventGarbageCollector {
    /// Flushes whatever the batch still holds, then drains the reclamation
    /// queue before returning.
    fn drop(&mut self) {
        let batch = self.batch.lock().expect("failed to lock").take();
        if !batch.is_empty() {
            self.flush(batch);
        }
    }
}

fn detach(tensor: &mut DenseTensor) -> Option<Garbage> {
    tensor.take_storage().map(Garbage::new)
}
