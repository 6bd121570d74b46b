//! In-memory reference output tree.
//!
//! `MemoryDom` implements `OutputAdapter` over an arena of node records. It is
//! strict: invalid handles, double attachment, cycles and removals of
//! non-children are reported as errors instead of being ignored, which makes
//! it suitable for validating reconciler output in tests.
//!
//! Besides the tree itself it tracks per-operation counters, the number of
//! nodes attached under a root (and its high-water mark), and supports
//! injecting a failure into the n-th call of an operation.

use crate::adapter::{AdapterError, AdapterOp, OutputAdapter};
use core_types::NodeHandle;
use std::collections::BTreeMap;
use std::sync::Arc;
use vdom::{ElementType, Event, EventHandler, NODE_VALUE_KEY, PropValue};

#[derive(Debug)]
pub enum NodeKind {
    /// A container handed to `render`; never created by the reconciler.
    Root,
    Element {
        name: Arc<str>,
        props: BTreeMap<Arc<str>, PropValue>,
        listeners: Vec<(Arc<str>, EventHandler)>,
    },
    Text { text: String },
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Root | NodeKind::Element { .. })
    }
}

#[derive(Clone, Copy, Debug)]
struct Fault {
    op: AdapterOp,
    remaining: usize,
}

#[derive(Debug, Default)]
pub struct MemoryDom {
    nodes: Vec<NodeRecord>,
    counts: [u64; AdapterOp::ALL.len()],
    attached: usize,
    attached_high_water: usize,
    fault: Option<Fault>,
    node_limit: Option<u32>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree that refuses to allocate handles above `limit`, for exercising
    /// exhaustion without allocating the whole `u32` handle space.
    pub fn with_node_limit(limit: u32) -> Self {
        Self {
            node_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Create a container node. Containers are attached by definition.
    pub fn create_root(&mut self) -> Result<NodeHandle, AdapterError> {
        self.push(NodeKind::Root)
    }

    /// Fail the `nth` (1-based) next call of `op` with `AdapterError::Injected`.
    pub fn inject_fault(&mut self, op: AdapterOp, nth: usize) {
        self.fault = Some(Fault {
            op,
            remaining: nth.max(1),
        });
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    pub fn node(&self, node: NodeHandle) -> Option<&NodeKind> {
        self.record(node).ok().map(|r| &r.kind)
    }

    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.record(node).ok().and_then(|r| r.parent)
    }

    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.record(node)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag_name(&self, node: NodeHandle) -> Option<&str> {
        match self.node(node)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeHandle) -> Option<&str> {
        match self.node(node)? {
            NodeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn property(&self, node: NodeHandle, name: &str) -> Option<&PropValue> {
        match self.node(node)? {
            NodeKind::Element { props, .. } => props.get(name),
            _ => None,
        }
    }

    pub fn listener_count(&self, node: NodeHandle, event: &str) -> usize {
        match self.node(node) {
            Some(NodeKind::Element { listeners, .. }) => {
                listeners.iter().filter(|(name, _)| &**name == event).count()
            }
            _ => 0,
        }
    }

    /// Invoke every listener registered for `event.name` on `node` (no
    /// bubbling). Returns the number of handlers called.
    pub fn dispatch(&self, node: NodeHandle, event: &Event) -> usize {
        let Some(NodeKind::Element { listeners, .. }) = self.node(node) else {
            return 0;
        };
        let mut called = 0;
        for (name, handler) in listeners {
            if *name == event.name {
                handler.call(event);
                called += 1;
            }
        }
        called
    }

    /// Concatenated text of every text node below `node`, in tree order.
    pub fn text_content(&self, node: NodeHandle) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeHandle, out: &mut String) {
        if let Some(text) = self.text(node) {
            out.push_str(text);
        }
        for child in self.children(node) {
            self.collect_text(*child, out);
        }
    }

    pub fn is_attached(&self, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            let Ok(record) = self.record(handle) else {
                return false;
            };
            if matches!(record.kind, NodeKind::Root) {
                return true;
            }
            current = record.parent;
        }
        false
    }

    /// Number of non-root nodes currently reachable from a root.
    pub fn attached_count(&self) -> usize {
        self.attached
    }

    pub fn attached_high_water(&self) -> usize {
        self.attached_high_water
    }

    pub fn reset_high_water(&mut self) {
        self.attached_high_water = self.attached;
    }

    pub fn op_count(&self, op: AdapterOp) -> u64 {
        self.counts[op.index()]
    }

    /// Count of every operation except node creation.
    pub fn mutation_count(&self) -> u64 {
        AdapterOp::ALL
            .iter()
            .filter(|op| **op != AdapterOp::CreateNode)
            .map(|op| self.op_count(*op))
            .sum()
    }

    pub fn reset_counts(&mut self) {
        self.counts = [0; AdapterOp::ALL.len()];
    }

    /// Handles are 1-based so that `NodeHandle::INVALID` is never handed out.
    fn push(&mut self, kind: NodeKind) -> Result<NodeHandle, AdapterError> {
        let handle = u32::try_from(self.nodes.len() + 1)
            .ok()
            .filter(|next| self.node_limit.is_none_or(|limit| *next <= limit))
            .map(NodeHandle)
            .ok_or(AdapterError::HandlesExhausted)?;
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        Ok(handle)
    }

    fn record(&self, node: NodeHandle) -> Result<&NodeRecord, AdapterError> {
        let index = (node.0 as usize)
            .checked_sub(1)
            .ok_or(AdapterError::UnknownNode(node))?;
        self.nodes.get(index).ok_or(AdapterError::UnknownNode(node))
    }

    fn record_mut(&mut self, node: NodeHandle) -> Result<&mut NodeRecord, AdapterError> {
        let index = (node.0 as usize)
            .checked_sub(1)
            .ok_or(AdapterError::UnknownNode(node))?;
        self.nodes
            .get_mut(index)
            .ok_or(AdapterError::UnknownNode(node))
    }

    fn begin(&mut self, op: AdapterOp) -> Result<(), AdapterError> {
        if let Some(fault) = self.fault.as_mut()
            && fault.op == op
        {
            fault.remaining -= 1;
            if fault.remaining == 0 {
                self.fault = None;
                log::debug!(target: "dom.memory", "injected failure in {}", op.name());
                return Err(AdapterError::Injected(op));
            }
        }
        Ok(())
    }

    fn finish(&mut self, op: AdapterOp) {
        self.counts[op.index()] = self.counts[op.index()].saturating_add(1);
    }

    fn subtree_len(&self, node: NodeHandle) -> usize {
        1 + self
            .children(node)
            .iter()
            .map(|child| self.subtree_len(*child))
            .sum::<usize>()
    }

    fn is_ancestor_or_self(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.parent(handle);
        }
        false
    }

    fn element_parts(
        &mut self,
        node: NodeHandle,
    ) -> Result<
        (
            &mut BTreeMap<Arc<str>, PropValue>,
            &mut Vec<(Arc<str>, EventHandler)>,
        ),
        AdapterError,
    > {
        match &mut self.record_mut(node)?.kind {
            NodeKind::Element {
                props, listeners, ..
            } => Ok((props, listeners)),
            _ => Err(AdapterError::WrongNodeKind(node)),
        }
    }
}

impl OutputAdapter for MemoryDom {
    fn create_node(&mut self, ty: &ElementType) -> Result<NodeHandle, AdapterError> {
        self.begin(AdapterOp::CreateNode)?;
        let kind = match ty {
            ElementType::Tag(name) => NodeKind::Element {
                name: Arc::clone(name),
                props: BTreeMap::new(),
                listeners: Vec::new(),
            },
            ElementType::Text => NodeKind::Text {
                text: String::new(),
            },
        };
        let handle = self.push(kind)?;
        self.finish(AdapterOp::CreateNode);
        Ok(handle)
    }

    fn set_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), AdapterError> {
        self.begin(AdapterOp::SetProperty)?;
        match &mut self.record_mut(node)?.kind {
            NodeKind::Element { props, .. } => {
                props.insert(Arc::from(name), value.clone());
            }
            NodeKind::Text { text } if name == NODE_VALUE_KEY => {
                *text = value.to_string();
            }
            NodeKind::Text { .. } | NodeKind::Root => {
                return Err(AdapterError::WrongNodeKind(node));
            }
        }
        self.finish(AdapterOp::SetProperty);
        Ok(())
    }

    fn remove_property(&mut self, node: NodeHandle, name: &str) -> Result<(), AdapterError> {
        self.begin(AdapterOp::RemoveProperty)?;
        match &mut self.record_mut(node)?.kind {
            NodeKind::Element { props, .. } => {
                props.remove(name);
            }
            NodeKind::Text { text } if name == NODE_VALUE_KEY => text.clear(),
            NodeKind::Text { .. } | NodeKind::Root => {
                return Err(AdapterError::WrongNodeKind(node));
            }
        }
        self.finish(AdapterOp::RemoveProperty);
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), AdapterError> {
        self.begin(AdapterOp::AddListener)?;
        let (_, listeners) = self.element_parts(node)?;
        listeners.push((Arc::from(event), handler.clone()));
        self.finish(AdapterOp::AddListener);
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), AdapterError> {
        self.begin(AdapterOp::RemoveListener)?;
        let (_, listeners) = self.element_parts(node)?;
        let position = listeners
            .iter()
            .position(|(name, existing)| &**name == event && existing.same(handler));
        match position {
            Some(index) => {
                listeners.remove(index);
            }
            None => {
                log::trace!(target: "dom.memory", "remove_listener: no `{event}` listener on node {}", node.0);
            }
        }
        self.finish(AdapterOp::RemoveListener);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), AdapterError> {
        self.begin(AdapterOp::AppendChild)?;
        if !self.record(parent)?.allows_children() {
            return Err(AdapterError::WrongNodeKind(parent));
        }
        let child_record = self.record(child)?;
        if child_record.parent.is_some() || matches!(child_record.kind, NodeKind::Root) {
            return Err(AdapterError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(AdapterError::CycleDetected { parent, child });
        }
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        if self.is_attached(parent) {
            self.attached += self.subtree_len(child);
            self.attached_high_water = self.attached_high_water.max(self.attached);
        }
        self.finish(AdapterOp::AppendChild);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), AdapterError> {
        self.begin(AdapterOp::RemoveChild)?;
        let position = self
            .record(parent)?
            .children
            .iter()
            .position(|k| *k == child)
            .ok_or(AdapterError::NotAChild { parent, child })?;
        let was_attached = self.is_attached(parent);
        self.record_mut(parent)?.children.remove(position);
        self.record_mut(child)?.parent = None;
        if was_attached {
            self.attached = self.attached.saturating_sub(self.subtree_len(child));
        }
        self.finish(AdapterOp::RemoveChild);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn div() -> ElementType {
        ElementType::tag("div")
    }

    #[test]
    fn append_tracks_attached_count() {
        let mut dom = MemoryDom::new();
        let root = dom.create_root().unwrap();
        let a = dom.create_node(&div()).unwrap();
        let b = dom.create_node(&ElementType::Text).unwrap();
        dom.append_child(a, b).unwrap();
        assert_eq!(dom.attached_count(), 0, "detached subtree is not counted");
        dom.append_child(root, a).unwrap();
        assert_eq!(dom.attached_count(), 2);
        dom.remove_child(root, a).unwrap();
        assert_eq!(dom.attached_count(), 0);
        assert_eq!(dom.attached_high_water(), 2);
        assert!(!dom.is_attached(b));
    }

    #[test]
    fn handle_exhaustion_is_an_error() {
        let mut dom = MemoryDom::with_node_limit(2);
        let root = dom.create_root().unwrap();
        let node = dom.create_node(&div()).unwrap();
        assert_eq!((root, node), (NodeHandle(1), NodeHandle(2)));
        assert_eq!(dom.create_node(&div()), Err(AdapterError::HandlesExhausted));
        assert_eq!(dom.create_root(), Err(AdapterError::HandlesExhausted));
        assert_eq!(dom.op_count(AdapterOp::CreateNode), 1);
        assert!(dom.node(NodeHandle(3)).is_none());
    }

    #[test]
    fn append_rejects_double_parent_and_cycles() {
        let mut dom = MemoryDom::new();
        let root = dom.create_root().unwrap();
        let a = dom.create_node(&div()).unwrap();
        let b = dom.create_node(&div()).unwrap();
        dom.append_child(a, b).unwrap();
        assert_eq!(
            dom.append_child(b, a),
            Err(AdapterError::CycleDetected {
                parent: b,
                child: a
            })
        );
        assert_eq!(dom.append_child(root, b), Err(AdapterError::AlreadyAttached(b)));
        assert_eq!(dom.append_child(a, a), Err(AdapterError::CycleDetected { parent: a, child: a }));
    }

    #[test]
    fn remove_rejects_non_children() {
        let mut dom = MemoryDom::new();
        let root = dom.create_root().unwrap();
        let a = dom.create_node(&div()).unwrap();
        assert_eq!(
            dom.remove_child(root, a),
            Err(AdapterError::NotAChild {
                parent: root,
                child: a
            })
        );
    }

    #[test]
    fn text_nodes_only_accept_node_value() {
        let mut dom = MemoryDom::new();
        let t = dom.create_node(&ElementType::Text).unwrap();
        dom.set_property(t, NODE_VALUE_KEY, &PropValue::from(7)).unwrap();
        assert_eq!(dom.text(t), Some("7"));
        assert_eq!(
            dom.set_property(t, "title", &PropValue::from("x")),
            Err(AdapterError::WrongNodeKind(t))
        );
        dom.remove_property(t, NODE_VALUE_KEY).unwrap();
        assert_eq!(dom.text(t), Some(""));
    }

    #[test]
    fn listeners_are_matched_by_identity() {
        let mut dom = MemoryDom::new();
        let node = dom.create_node(&div()).unwrap();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let h1 = EventHandler::new(move |_| seen.set(seen.get() + 1));
        let h2 = EventHandler::new(|_| {});
        dom.add_listener(node, "click", &h1).unwrap();
        dom.remove_listener(node, "click", &h2).unwrap();
        assert_eq!(dom.listener_count(node, "click"), 1);
        assert_eq!(dom.dispatch(node, &Event::new("click")), 1);
        assert_eq!(hits.get(), 1);
        dom.remove_listener(node, "click", &h1).unwrap();
        assert_eq!(dom.listener_count(node, "click"), 0);
    }

    #[test]
    fn injected_fault_fires_once_on_nth_call() {
        let mut dom = MemoryDom::new();
        dom.inject_fault(AdapterOp::CreateNode, 2);
        assert!(dom.create_node(&div()).is_ok());
        assert_eq!(
            dom.create_node(&div()),
            Err(AdapterError::Injected(AdapterOp::CreateNode))
        );
        assert!(dom.create_node(&div()).is_ok());
        assert_eq!(dom.op_count(AdapterOp::CreateNode), 2);
    }

    #[test]
    fn unknown_handles_are_errors() {
        let mut dom = MemoryDom::new();
        assert_eq!(
            dom.set_property(NodeHandle(99), "a", &PropValue::from(1)),
            Err(AdapterError::UnknownNode(NodeHandle(99)))
        );
        assert_eq!(
            dom.remove_property(NodeHandle::INVALID, "a"),
            Err(AdapterError::UnknownNode(NodeHandle::INVALID))
        );
    }
}
