//! Commit-time mutation protocol.
//!
//! A commit is planned as an ordered list of `Mutation`s and then applied to
//! an `OutputAdapter` in that order.
//!
//! Invariants:
//! - Mutations are applied in order; removals of deleted subtrees come first.
//! - Every handle refers to a node that exists in the output tree when the
//!   mutation is applied.
//! - A node has at most one parent; `AppendChild` never targets an attached node.
//! - Node creation is not part of the protocol: nodes are created detached
//!   during the render phase and only become visible through `AppendChild`.

use crate::adapter::{AdapterError, AdapterOp, OutputAdapter};
use core_types::NodeHandle;
use std::sync::Arc;
use vdom::{EventHandler, PropValue};

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Attach a node as the last child of `parent`.
    AppendChild { parent: NodeHandle, child: NodeHandle },
    /// Detach a node and its subtree from `parent`.
    RemoveChild { parent: NodeHandle, child: NodeHandle },
    SetProperty {
        node: NodeHandle,
        name: Arc<str>,
        value: PropValue,
    },
    /// Reset a property to its empty value.
    RemoveProperty { node: NodeHandle, name: Arc<str> },
    AddListener {
        node: NodeHandle,
        event: Arc<str>,
        handler: EventHandler,
    },
    RemoveListener {
        node: NodeHandle,
        event: Arc<str>,
        handler: EventHandler,
    },
}

impl Mutation {
    pub fn op(&self) -> AdapterOp {
        match self {
            Mutation::AppendChild { .. } => AdapterOp::AppendChild,
            Mutation::RemoveChild { .. } => AdapterOp::RemoveChild,
            Mutation::SetProperty { .. } => AdapterOp::SetProperty,
            Mutation::RemoveProperty { .. } => AdapterOp::RemoveProperty,
            Mutation::AddListener { .. } => AdapterOp::AddListener,
            Mutation::RemoveListener { .. } => AdapterOp::RemoveListener,
        }
    }

    /// The node whose own state (or child list) this mutation changes.
    pub fn target(&self) -> NodeHandle {
        match self {
            Mutation::AppendChild { parent, .. } | Mutation::RemoveChild { parent, .. } => *parent,
            Mutation::SetProperty { node, .. }
            | Mutation::RemoveProperty { node, .. }
            | Mutation::AddListener { node, .. }
            | Mutation::RemoveListener { node, .. } => *node,
        }
    }

    pub fn apply<A: OutputAdapter + ?Sized>(&self, adapter: &mut A) -> Result<(), AdapterError> {
        match self {
            Mutation::AppendChild { parent, child } => adapter.append_child(*parent, *child),
            Mutation::RemoveChild { parent, child } => adapter.remove_child(*parent, *child),
            Mutation::SetProperty { node, name, value } => {
                adapter.set_property(*node, name, value)
            }
            Mutation::RemoveProperty { node, name } => adapter.remove_property(*node, name),
            Mutation::AddListener {
                node,
                event,
                handler,
            } => adapter.add_listener(*node, event, handler),
            Mutation::RemoveListener {
                node,
                event,
                handler,
            } => adapter.remove_listener(*node, event, handler),
        }
    }
}

/// Apply mutations in order, stopping at the first failure.
///
/// Returns the number of mutations applied before the failure alongside the
/// error, so callers can report how far a commit got.
pub fn apply_mutations<A: OutputAdapter + ?Sized>(
    adapter: &mut A,
    mutations: &[Mutation],
) -> Result<usize, (usize, AdapterError)> {
    for (index, mutation) in mutations.iter().enumerate() {
        log::trace!(target: "dom.mutation", "apply #{index}: {mutation:?}");
        mutation.apply(adapter).map_err(|err| (index, err))?;
    }
    Ok(mutations.len())
}
