use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use thiserror::Error;

use crate::device::Place;

/// Element type of a dense tensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DataType {
    #[default]
    F32,
    F16,
    U8,
    U16,
    U32,
}

impl DataType {
    /// Size of the type in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::F32 | Self::U32 => 4,
            Self::F16 | Self::U16 => 2,
            Self::U8 => 1,
        }
    }
}

/// Plain-old-data types a tensor buffer can be built from.
pub trait Scalar: bytemuck::Pod {
    const DATA_TYPE: DataType;
}

impl Scalar for f32 {
    const DATA_TYPE: DataType = DataType::F32;
}

impl Scalar for half::f16 {
    const DATA_TYPE: DataType = DataType::F16;
}

impl Scalar for u8 {
    const DATA_TYPE: DataType = DataType::U8;
}

impl Scalar for u16 {
    const DATA_TYPE: DataType = DataType::U16;
}

impl Scalar for u32 {
    const DATA_TYPE: DataType = DataType::U32;
}

#[derive(Debug, Error)]
pub enum TensorError {
    #[error("tensor creation error: size {0} not match data len {1}")]
    Create(usize, usize),
}

/// A reference-counted device buffer.
///
/// The buffer returns to its place's allocator when the last reference drops,
/// wherever that happens.
#[derive(Debug)]
pub struct Storage {
    place: Place,
    data: Box<[u8]>,
}

impl Storage {
    pub fn zeros(place: Place, size: usize) -> Self {
        let data = bytemuck::zeroed_slice_box(size);
        Self { place, data }
    }

    #[inline]
    pub fn place(&self) -> Place {
        self.place
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A dense tensor: a shape and element type over an optional shared buffer.
///
/// The buffer is detachable. [`DenseTensor::take_storage`] hands the buffer
/// over to the caller and leaves the tensor unallocated, with shape and type
/// intact.
#[derive(Debug, Default, Clone)]
pub struct DenseTensor {
    shape: Vec<usize>,
    r#type: DataType,
    storage: Option<Arc<Storage>>,
}

impl Display for DenseTensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.shape.iter().format("x"), self.r#type)
    }
}

impl DenseTensor {
    /// A zero-filled tensor of the given shape on the given place.
    pub fn zeros(place: Place, shape: impl Into<Vec<usize>>, r#type: DataType) -> Self {
        let shape = shape.into();
        let size = shape.iter().product::<usize>() * r#type.size();
        let storage = Some(Arc::new(Storage::zeros(place, size)));
        Self {
            shape,
            r#type,
            storage,
        }
    }

    /// A tensor of the given shape initialized from `contents`.
    pub fn from_data<T: Scalar>(
        place: Place,
        shape: impl Into<Vec<usize>>,
        contents: &[T],
    ) -> Result<Self, TensorError> {
        let shape = shape.into();
        let size = shape.iter().product::<usize>();
        if contents.len() != size {
            return Err(TensorError::Create(size, contents.len()));
        }
        let data = bytemuck::cast_slice(contents).into();
        let storage = Some(Arc::new(Storage { place, data }));
        Ok(Self {
            shape,
            r#type: T::DATA_TYPE,
            storage,
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.r#type
    }

    #[inline]
    pub fn storage(&self) -> Option<&Arc<Storage>> {
        self.storage.as_ref()
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    /// Size of the held buffer in bytes, 0 once detached.
    #[inline]
    pub fn data_size(&self) -> usize {
        self.storage.as_ref().map_or(0, |storage| storage.size())
    }

    /// Detaches the buffer, leaving the tensor unallocated.
    pub fn take_storage(&mut self) -> Option<Arc<Storage>> {
        self.storage.take()
    }
}

/// A sparse tensor in row-compressed form: the set of populated row indices
/// and a dense value tensor holding them.
#[derive(Debug, Default, Clone)]
pub struct SparseRows {
    pub rows: Vec<i64>,
    pub value: DenseTensor,
}

/// A growable list of dense tensors.
#[derive(Debug, Default, Clone, Deref, DerefMut)]
pub struct TensorArray(pub Vec<DenseTensor>);
