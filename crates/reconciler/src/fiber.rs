//! Fiber records and the arena that links them.
//!
//! Fibers form a left-child/right-sibling tree with parent back-links. Links
//! are arena keys, not owning pointers, so a walk can resume from any fiber in
//! O(1) and no reference cycles exist.
//!
//! Invariants:
//! - In a work-in-progress tree every fiber is reachable through exactly one
//!   `child`/`sibling` link.
//! - `parent` is set when a fiber is created and never re-pointed.
//! - `alternate` and `parent` are weak: after the replaced tree is swept, a
//!   stale key resolves to `None` instead of dangling.
//! - Fibers tagged `Deletion` belong to the previous tree and are never
//!   linked into the work-in-progress tree.

use core_types::{NodeHandle, RenderGeneration};
use slotmap::SlotMap;
use std::rc::Rc;
use vdom::{ElementType, Props};

slotmap::new_key_type! {
    /// Arena key of a fiber.
    pub struct FiberId;
}

/// Mutation a fiber requires during commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

#[derive(Debug)]
pub struct Fiber {
    /// `None` only for a root fiber, whose node is the render container.
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<NodeHandle>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: Option<EffectTag>,
    pub(crate) generation: RenderGeneration,
}

impl Fiber {
    pub(crate) fn root(
        container: NodeHandle,
        props: Rc<Props>,
        alternate: Option<FiberId>,
        generation: RenderGeneration,
    ) -> Self {
        Self {
            ty: None,
            props,
            dom: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect_tag: None,
            generation,
        }
    }

    pub fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    pub fn dom(&self) -> Option<NodeHandle> {
        self.dom
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect_tag(&self) -> Option<EffectTag> {
        self.effect_tag
    }

    pub fn generation(&self) -> RenderGeneration {
        self.generation
    }

    pub fn is_root(&self) -> bool {
        self.ty.is_none()
    }
}

#[derive(Debug, Default)]
pub struct FiberArena {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Next fiber in depth-first pre-order: the first child, else the nearest
    /// sibling of `id` or of one of its ancestors. `None` once the walk climbs
    /// past the root.
    pub fn next_in_walk(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.fibers.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut current = Some(id);
        while let Some(fid) = current {
            let fiber = self.fibers.get(fid)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            current = fiber.parent;
        }
        None
    }

    /// Children of `id` in sibling order.
    pub fn children(&self, id: FiberId) -> Children<'_> {
        Children {
            arena: self,
            next: self.fibers.get(id).and_then(|f| f.child),
        }
    }

    /// Drop `root` and every fiber reachable from it through `child` and
    /// `sibling` links. Used to sweep a tree once its replacement is committed;
    /// trees committed into other containers are left alone.
    pub(crate) fn remove_tree(&mut self, root: FiberId) -> usize {
        let mut doomed = Vec::new();
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            doomed.push(id);
            cursor = self.next_in_subtree(root, id);
        }
        doomed
            .into_iter()
            .filter(|id| self.fibers.remove(*id).is_some())
            .count()
    }

    /// Like `next_in_walk`, but never leaves the subtree below `root`.
    fn next_in_subtree(&self, root: FiberId, id: FiberId) -> Option<FiberId> {
        let fiber = self.fibers.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut current = id;
        while current != root {
            let fiber = self.fibers.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            current = fiber.parent?;
        }
        None
    }

    /// Drop every fiber of exactly `generation` (an abandoned work-in-progress tree).
    pub(crate) fn remove_generation(&mut self, generation: RenderGeneration) -> usize {
        let before = self.fibers.len();
        self.fibers.retain(|_, fiber| fiber.generation != generation);
        before - self.fibers.len()
    }
}

pub struct Children<'a> {
    arena: &'a FiberArena,
    next: Option<FiberId>,
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.arena.get(id).and_then(|f| f.sibling);
        Some(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn leaf(
        arena: &mut FiberArena,
        tag: &str,
        parent: FiberId,
        generation: RenderGeneration,
    ) -> FiberId {
        arena.insert(Fiber {
            ty: Some(ElementType::tag(tag)),
            props: Rc::new(Props::new()),
            dom: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: None,
            generation,
        })
    }

    pub(crate) fn link(arena: &mut FiberArena, parent: FiberId, kids: &[FiberId]) {
        arena.get_mut(parent).unwrap().child = kids.first().copied();
        for pair in kids.windows(2) {
            arena.get_mut(pair[0]).unwrap().sibling = Some(pair[1]);
        }
    }

    #[test]
    fn walk_is_preorder_and_ends_at_root() {
        let g = RenderGeneration(1);
        let mut arena = FiberArena::new();
        let root = arena.insert(Fiber::root(NodeHandle(1), Rc::new(Props::new()), None, g));
        let a = leaf(&mut arena, "a", root, g);
        let b = leaf(&mut arena, "b", root, g);
        let a1 = leaf(&mut arena, "a1", a, g);
        let a2 = leaf(&mut arena, "a2", a, g);
        let b1 = leaf(&mut arena, "b1", b, g);
        link(&mut arena, root, &[a, b]);
        link(&mut arena, a, &[a1, a2]);
        link(&mut arena, b, &[b1]);

        let mut order = vec![root];
        let mut cursor = root;
        while let Some(next) = arena.next_in_walk(cursor) {
            order.push(next);
            cursor = next;
        }
        assert_eq!(order, vec![root, a, a1, a2, b, b1]);
    }

    #[test]
    fn children_iterates_sibling_chain() {
        let g = RenderGeneration(1);
        let mut arena = FiberArena::new();
        let root = arena.insert(Fiber::root(NodeHandle(1), Rc::new(Props::new()), None, g));
        let kids: Vec<_> = (0..3).map(|_| leaf(&mut arena, "li", root, g)).collect();
        link(&mut arena, root, &kids);
        assert_eq!(arena.children(root).collect::<Vec<_>>(), kids);
    }

    #[test]
    fn sweep_turns_stale_keys_into_none() {
        let mut arena = FiberArena::new();
        let old = arena.insert(Fiber::root(
            NodeHandle(1),
            Rc::new(Props::new()),
            None,
            RenderGeneration(1),
        ));
        let new = arena.insert(Fiber::root(
            NodeHandle(1),
            Rc::new(Props::new()),
            Some(old),
            RenderGeneration(2),
        ));
        assert_eq!(arena.remove_tree(old), 1);
        let alternate = arena.get(new).and_then(Fiber::alternate);
        assert_eq!(alternate, Some(old));
        assert!(arena.get(old).is_none());
        assert_eq!(arena.remove_generation(RenderGeneration(2)), 1);
        assert!(arena.is_empty());
    }

    #[test]
    fn remove_tree_keeps_other_roots() {
        let g = RenderGeneration(1);
        let mut arena = FiberArena::new();
        let first = arena.insert(Fiber::root(NodeHandle(1), Rc::new(Props::new()), None, g));
        let second = arena.insert(Fiber::root(NodeHandle(2), Rc::new(Props::new()), None, g));
        let a = leaf(&mut arena, "a", first, g);
        let b = leaf(&mut arena, "b", first, g);
        let a1 = leaf(&mut arena, "a1", a, g);
        let kept = leaf(&mut arena, "c", second, g);
        link(&mut arena, first, &[a, b]);
        link(&mut arena, a, &[a1]);
        link(&mut arena, second, &[kept]);

        assert_eq!(arena.remove_tree(first), 4);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(second).is_some());
        assert!(arena.get(kept).is_some());
    }
}
