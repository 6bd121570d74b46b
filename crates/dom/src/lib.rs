//! # dom
//!
//! The output side of reconciliation:
//! - [`OutputAdapter`]: native-tree primitives the reconciler drives
//! - [`Mutation`]: the ordered commit protocol applied through an adapter
//! - [`MemoryDom`]: a strict in-memory output tree implementing the adapter
//! - [`OutputSnapshot`]: deterministic serialization for comparisons

mod adapter;
mod memory;
mod mutation;
mod snapshot;

pub use adapter::{AdapterError, AdapterOp, OutputAdapter};
pub use memory::{MemoryDom, NodeKind};
pub use mutation::{Mutation, apply_mutations};
pub use snapshot::OutputSnapshot;
