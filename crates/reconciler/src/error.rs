use crate::fiber::FiberId;
use dom::AdapterError;
use std::fmt;

/// Internal-consistency failures in the fiber tree. These indicate a bug in
/// the reconciler (or a corrupted arena), never bad input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    MissingFiber(FiberId),
    MissingParent(FiberId),
    /// A non-root fiber without an element type.
    UntypedFiber(FiberId),
    DeletionWithoutDom(FiberId),
    DeletionInWorkTree(FiberId),
    UpdateWithoutAlternate(FiberId),
    NoAncestorDom(FiberId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::MissingFiber(id) => write!(f, "fiber {id:?} is not in the arena"),
            InvariantViolation::MissingParent(id) => write!(f, "fiber {id:?} has no parent"),
            InvariantViolation::UntypedFiber(id) => {
                write!(f, "non-root fiber {id:?} has no element type")
            }
            InvariantViolation::DeletionWithoutDom(id) => {
                write!(f, "fiber {id:?} is tagged for deletion but owns no output node")
            }
            InvariantViolation::DeletionInWorkTree(id) => {
                write!(f, "deletion-tagged fiber {id:?} is linked into the work-in-progress tree")
            }
            InvariantViolation::UpdateWithoutAlternate(id) => {
                write!(f, "fiber {id:?} is tagged for update but has no alternate")
            }
            InvariantViolation::NoAncestorDom(id) => {
                write!(f, "no ancestor of fiber {id:?} owns an output node")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// The output adapter rejected an operation.
    Adapter(AdapterError),
    Invariant(InvariantViolation),
    /// A commit failed partway and undoing its applied mutations failed too.
    /// The output tree matches neither the previous nor the new tree.
    RollbackFailed {
        commit: AdapterError,
        rollback: AdapterError,
    },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Adapter(err) => write!(f, "output adapter failed: {err}"),
            ReconcileError::Invariant(err) => write!(f, "fiber tree invariant violated: {err}"),
            ReconcileError::RollbackFailed { commit, rollback } => write!(
                f,
                "output adapter failed: {commit}; undoing the partial commit failed: {rollback}"
            ),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Adapter(err) => Some(err),
            ReconcileError::Invariant(err) => Some(err),
            ReconcileError::RollbackFailed { commit, .. } => Some(commit),
        }
    }
}

impl From<AdapterError> for ReconcileError {
    fn from(err: AdapterError) -> Self {
        ReconcileError::Adapter(err)
    }
}

impl From<InvariantViolation> for ReconcileError {
    fn from(err: InvariantViolation) -> Self {
        ReconcileError::Invariant(err)
    }
}
