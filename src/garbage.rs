use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::device::{ContextId, DeviceContext, Place};
use crate::fence::Fence;
use crate::tensor::Storage;

/// A detached buffer awaiting reclamation.
///
/// Holding the garbage holds the buffer alive; dropping it is the free.
#[derive(Debug, Clone)]
pub struct Garbage(Arc<Storage>);

impl Garbage {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self(storage)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.0.size()
    }

    #[inline]
    pub fn place(&self) -> Place {
        self.0.place()
    }
}

/// Garbage accumulated since the last flush, together with the newest
/// completion fence seen per device context.
///
/// Streams run in order, so the newest fence of a context covers every older
/// item collected from it. One fence per context is all a flush has to wait
/// for.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    items: Vec<Garbage>,
    bytes: usize,
    latest: HashMap<ContextId, (DeviceContext, Fence)>,
}

impl PendingBatch {
    pub fn push(&mut self, garbage: Garbage, context: &DeviceContext, fence: &Fence) {
        self.bytes += garbage.size();
        self.items.push(garbage);
        self.latest
            .insert(context.id(), (context.clone(), fence.clone()));
    }

    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empties the batch, returning its previous contents.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn into_parts(self) -> (Vec<Garbage>, HashMap<ContextId, (DeviceContext, Fence)>) {
        (self.items, self.latest)
    }
}
