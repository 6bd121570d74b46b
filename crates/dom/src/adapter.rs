//! Output adapter trait: the native-tree primitives the reconciler drives.
//!
//! The reconciler never inspects the output tree; it only issues these
//! primitives. Implementations decide what a node is (a browser element, a
//! terminal widget, an in-memory record).

use core_types::NodeHandle;
use std::fmt;
use vdom::{ElementType, EventHandler, PropValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterOp {
    CreateNode,
    SetProperty,
    RemoveProperty,
    AddListener,
    RemoveListener,
    AppendChild,
    RemoveChild,
}

impl AdapterOp {
    pub const ALL: [AdapterOp; 7] = [
        AdapterOp::CreateNode,
        AdapterOp::SetProperty,
        AdapterOp::RemoveProperty,
        AdapterOp::AddListener,
        AdapterOp::RemoveListener,
        AdapterOp::AppendChild,
        AdapterOp::RemoveChild,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            AdapterOp::CreateNode => "create_node",
            AdapterOp::SetProperty => "set_property",
            AdapterOp::RemoveProperty => "remove_property",
            AdapterOp::AddListener => "add_listener",
            AdapterOp::RemoveListener => "remove_listener",
            AdapterOp::AppendChild => "append_child",
            AdapterOp::RemoveChild => "remove_child",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdapterError {
    UnknownNode(NodeHandle),
    WrongNodeKind(NodeHandle),
    NotAChild {
        parent: NodeHandle,
        child: NodeHandle,
    },
    AlreadyAttached(NodeHandle),
    CycleDetected {
        parent: NodeHandle,
        child: NodeHandle,
    },
    /// The adapter cannot represent another node handle.
    HandlesExhausted,
    /// Failure injected by a test adapter.
    Injected(AdapterOp),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::UnknownNode(node) => write!(f, "unknown output node {}", node.0),
            AdapterError::WrongNodeKind(node) => {
                write!(f, "operation not supported by output node {}", node.0)
            }
            AdapterError::NotAChild { parent, child } => {
                write!(f, "node {} is not a child of node {}", child.0, parent.0)
            }
            AdapterError::AlreadyAttached(node) => {
                write!(f, "node {} already has a parent", node.0)
            }
            AdapterError::CycleDetected { parent, child } => write!(
                f,
                "appending node {} under node {} would create a cycle",
                child.0, parent.0
            ),
            AdapterError::HandlesExhausted => f.write_str("no output node handles left"),
            AdapterError::Injected(op) => write!(f, "injected failure in {}", op.name()),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Native output-tree primitives.
///
/// All operations are fallible; a failure aborts the current render
/// generation without promoting it.
pub trait OutputAdapter {
    /// Create a detached node for a tag or the text sentinel.
    fn create_node(&mut self, ty: &ElementType) -> Result<NodeHandle, AdapterError>;

    fn set_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), AdapterError>;

    /// Reset a property to its empty value.
    fn remove_property(&mut self, node: NodeHandle, name: &str) -> Result<(), AdapterError>;

    fn add_listener(
        &mut self,
        node: NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), AdapterError>;

    fn remove_listener(
        &mut self,
        node: NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), AdapterError>;

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), AdapterError>;

    /// Detach `child` (and its subtree) from `parent`.
    fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), AdapterError>;
}
