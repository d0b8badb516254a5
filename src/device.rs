use std::sync::Arc;

use derive_more::{Deref, DerefMut, Display};

use crate::queue::WorkQueue;

/// Execution target an operation is scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Place {
    /// The host processor; work is synchronous with the dispatcher.
    #[display("host")]
    Host,
    /// An accelerator identified by its device ordinal.
    #[display("device:{_0}")]
    Device(usize),
}

impl Place {
    #[inline]
    pub fn is_host(self) -> bool {
        matches!(self, Place::Host)
    }
}

/// Unique identity of a device context within the process.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq, Hash, Deref, DerefMut)]
pub struct ContextId(uid::Id<ContextId>);

#[derive(Debug)]
struct Context {
    /// The unique identifier of the context.
    id: ContextId,
    place: Place,
    /// In-order stream runner; `None` for host places.
    stream: Option<WorkQueue>,
}

/// A device context: an execution place plus the command stream delivering
/// work to it.
///
/// Device places own a dedicated stream runner that executes submitted jobs
/// strictly in submission order, the guarantee completion fences build on.
/// Host places have no stream; submitted jobs run inline.
///
/// Contexts are cheap to clone and all clones share the same stream.
#[derive(Debug, Clone)]
pub struct DeviceContext(Arc<Context>);

impl DeviceContext {
    pub fn for_place(place: Place) -> Self {
        let stream = match place {
            Place::Host => None,
            Place::Device(device) => Some(WorkQueue::single_thread(format!("stream-{device}"))),
        };
        let id = ContextId(uid::Id::new());
        Self(Arc::new(Context { id, place, stream }))
    }

    /// Context for synchronous host execution.
    pub fn host() -> Self {
        Self::for_place(Place::Host)
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.0.id
    }

    #[inline]
    pub fn place(&self) -> Place {
        self.0.place
    }

    /// Submits a job onto the context's stream, after everything submitted
    /// before it. Host contexts execute the job before returning.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        match &self.0.stream {
            Some(stream) => stream.submit(job),
            None => job(),
        }
    }

    /// Blocks until every job submitted so far has executed.
    pub fn synchronize(&self) {
        if let Some(stream) = &self.0.stream {
            let (sender, receiver) = flume::bounded(0);
            stream.submit(move || _ = sender.send(()));
            _ = receiver.recv();
        }
    }
}
