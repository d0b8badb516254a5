//! `scythe` implements event-synchronized garbage collection for asynchronous tensor executors.
//! It lets a dispatcher discard a variable the moment its last consumer is issued, while the backing device memory is only reclaimed once the hardware is provably done with it.
//!
//! ## Key Components
//! 1. **Collection Core**:
//!    - [`EventGarbageCollector`] holding one completion fence per scheduled operation.
//!    - Three regimes behind a single byte threshold: disabled, immediate, batched.
//!    - Batch flushes wait on one fence per device context, the newest one.
//!
//! 2. **Device Abstraction**:
//!    - [`Place`] names an execution target; [`DeviceContext`] carries its command stream.
//!    - Device streams execute in submission order; host work runs inline.
//!
//! 3. **Synchronization**:
//!    - [`Fence`] marks a point in a stream and flips once the stream passes it.
//!    - Spinning or blocking waits, selectable per collector via [`WaitMode`].
//!
//! 4. **Variable Model**:
//!    - Dense, sparse and array tensors over reference-counted [`Storage`] buffers.
//!    - Program-owned kinds (scopes, feed queues, rank tables) are recognized and skipped.
//!
//! ## Design Principles
//! - **Non-blocking dispatch**: adding a variable never waits for the device.
//! - **Ordering over tracking**: stream order lets the newest fence cover a whole batch.
//! - **Ownership as reclamation**: dropping the last reference to a buffer is the free.
//!
//! The collector is the memory backbone of an executor; everything else here models just
//! enough of the executor for the collector to be exercised and tested against.

pub mod collector;
pub mod device;
pub mod fence;
pub mod garbage;
pub mod instruction;
pub mod queue;
pub mod tensor;
pub mod variable;

pub use collector::EventGarbageCollector;
pub use device::{ContextId, DeviceContext, Place};
pub use fence::{Fence, WaitMode};
pub use garbage::Garbage;
pub use instruction::Instruction;
pub use queue::WorkQueue;
pub use tensor::{DataType, DenseTensor, Scalar, SparseRows, Storage, TensorArray, TensorError};
pub use variable::{FeedQueue, RankTable, Scope, Variable};
