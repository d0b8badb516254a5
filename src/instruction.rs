use crate::device::DeviceContext;

/// One scheduled operation of an executor program: its ordinal in the plan
/// and the device context it runs on.
#[derive(Debug, Clone)]
pub struct Instruction {
    id: usize,
    context: DeviceContext,
}

impl Instruction {
    pub fn new(id: usize, context: DeviceContext) -> Self {
        Self { id, context }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn context(&self) -> &DeviceContext {
        &self.context
    }
}
