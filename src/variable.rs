use std::collections::VecDeque;

use rustc_hash::FxHashMap as HashMap;

use crate::tensor::{DenseTensor, SparseRows, TensorArray};

/// A named variable scope, as produced by control-flow operations.
///
/// Scope contents belong to the program, not to any single operation, so the
/// collector leaves them alone.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Variable>,
}

impl Scope {
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) {
        self.vars.insert(name.into(), var);
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Staging queue a feed operation pulls input tensors from.
#[derive(Debug, Default)]
pub struct FeedQueue {
    pub pending: VecDeque<DenseTensor>,
}

/// Sequence-length bookkeeping emitted by batched recurrent operations.
#[derive(Debug, Default)]
pub struct RankTable {
    pub items: Vec<(usize, usize)>,
}

/// The payload of an executor variable.
#[derive(Debug)]
pub enum Variable {
    Dense(DenseTensor),
    Sparse(SparseRows),
    Array(TensorArray),
    Scopes(Vec<Scope>),
    FeedQueue(FeedQueue),
    RankTable(RankTable),
    Strings(Vec<String>),
}

impl Variable {
    /// The kind tag, as it appears in executor diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dense(_) => "DenseTensor",
            Self::Sparse(_) => "SparseRows",
            Self::Array(_) => "TensorArray",
            Self::Scopes(_) => "ScopeList",
            Self::FeedQueue(_) => "FeedQueue",
            Self::RankTable(_) => "RankTable",
            Self::Strings(_) => "Strings",
        }
    }
}
