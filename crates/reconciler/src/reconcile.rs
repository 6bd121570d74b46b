//! Positional child reconciliation.
//!
//! New child elements and the alternate's old child fibers are walked in
//! lockstep by position (no keys). At each position:
//! - same type: new fiber reuses the old output node, tagged `Update`;
//! - element present, type differs or no old fiber: new fiber, `Placement`;
//! - old fiber present, type differs or no element: old fiber is tagged
//!   `Deletion` and queued; it is never linked into the new tree.
//!
//! A reordered list is therefore seen as per-position updates and
//! replacements, never as moves.

use crate::error::InvariantViolation;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};
use core_types::RenderGeneration;
use std::rc::Rc;
use vdom::Element;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

/// Build (and tag) the child fibers of `wip_fiber` from `elements`.
pub(crate) fn reconcile_children(
    arena: &mut FiberArena,
    deletions: &mut Vec<FiberId>,
    wip_fiber: FiberId,
    elements: &[Element],
    generation: RenderGeneration,
) -> Result<ReconcileCounts, InvariantViolation> {
    let alternate = arena
        .get(wip_fiber)
        .ok_or(InvariantViolation::MissingFiber(wip_fiber))?
        .alternate;
    let mut old_fiber = alternate.and_then(|alt| arena.get(alt)).and_then(|f| f.child);
    let mut prev_sibling: Option<FiberId> = None;
    let mut counts = ReconcileCounts::default();
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);
        let old = match old_fiber {
            Some(id) => Some((id, arena.get(id).ok_or(InvariantViolation::MissingFiber(id))?)),
            None => None,
        };
        let same_type = match (element, old) {
            (Some(element), Some((_, old))) => old.ty.as_ref() == Some(element.ty()),
            _ => false,
        };
        let next_old = old.and_then(|(_, f)| f.sibling);
        let inherited_dom = old.and_then(|(_, f)| f.dom);

        let new_fiber = match element {
            Some(element) if same_type => {
                counts.updates += 1;
                Some(arena.insert(Fiber {
                    ty: Some(element.ty().clone()),
                    props: Rc::clone(element.props()),
                    dom: inherited_dom,
                    parent: Some(wip_fiber),
                    child: None,
                    sibling: None,
                    alternate: old_fiber,
                    effect_tag: Some(EffectTag::Update),
                    generation,
                }))
            }
            Some(element) => {
                counts.placements += 1;
                Some(arena.insert(Fiber {
                    ty: Some(element.ty().clone()),
                    props: Rc::clone(element.props()),
                    dom: None,
                    parent: Some(wip_fiber),
                    child: None,
                    sibling: None,
                    alternate: None,
                    effect_tag: Some(EffectTag::Placement),
                    generation,
                }))
            }
            None => None,
        };

        if let Some(old_id) = old_fiber
            && !same_type
        {
            let old = arena
                .get_mut(old_id)
                .ok_or(InvariantViolation::MissingFiber(old_id))?;
            old.effect_tag = Some(EffectTag::Deletion);
            deletions.push(old_id);
            counts.deletions += 1;
        }

        if let Some(new_id) = new_fiber {
            let slot = match prev_sibling {
                None => &mut arena
                    .get_mut(wip_fiber)
                    .ok_or(InvariantViolation::MissingFiber(wip_fiber))?
                    .child,
                Some(prev) => &mut arena
                    .get_mut(prev)
                    .ok_or(InvariantViolation::MissingFiber(prev))?
                    .sibling,
            };
            *slot = Some(new_id);
            prev_sibling = Some(new_id);
        }

        old_fiber = next_old;
        index += 1;
    }

    log::trace!(
        target: "reconciler.reconcile",
        "fiber {wip_fiber:?}: {} children, +{} ~{} -{}",
        elements.len(),
        counts.placements,
        counts.updates,
        counts.deletions
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::tests::{leaf, link};
    use core_types::NodeHandle;
    use vdom::Props;

    fn old_tree(arena: &mut FiberArena, tags: &[&str]) -> (FiberId, Vec<FiberId>) {
        let g = RenderGeneration(1);
        let root = arena.insert(Fiber::root(NodeHandle(1), Rc::new(Props::new()), None, g));
        let kids: Vec<_> = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                let id = leaf(arena, tag, root, g);
                arena.get_mut(id).unwrap().dom = Some(NodeHandle(10 + i as u32));
                id
            })
            .collect();
        link(arena, root, &kids);
        (root, kids)
    }

    fn wip_root(arena: &mut FiberArena, alternate: FiberId) -> FiberId {
        arena.insert(Fiber::root(
            NodeHandle(1),
            Rc::new(Props::new()),
            Some(alternate),
            RenderGeneration(2),
        ))
    }

    fn tags(arena: &FiberArena, parent: FiberId) -> Vec<(String, Option<EffectTag>)> {
        arena
            .children(parent)
            .map(|id| {
                let f = arena.get(id).unwrap();
                let name = f.ty().and_then(|t| t.tag_name()).unwrap_or("#text");
                (name.to_string(), f.effect_tag())
            })
            .collect()
    }

    #[test]
    fn lockstep_update_place_delete() {
        let mut arena = FiberArena::new();
        let (old_root, old_kids) = old_tree(&mut arena, &["div", "span"]);
        let wip = wip_root(&mut arena, old_root);
        let elements = vec![Element::new("div"), Element::new("p"), Element::new("em")];
        let mut deletions = Vec::new();

        let counts = reconcile_children(
            &mut arena,
            &mut deletions,
            wip,
            &elements,
            RenderGeneration(2),
        )
        .unwrap();

        assert_eq!(
            counts,
            ReconcileCounts {
                placements: 2,
                updates: 1,
                deletions: 1
            }
        );
        assert_eq!(
            tags(&arena, wip),
            vec![
                ("div".to_string(), Some(EffectTag::Update)),
                ("p".to_string(), Some(EffectTag::Placement)),
                ("em".to_string(), Some(EffectTag::Placement)),
            ]
        );
        assert_eq!(deletions, vec![old_kids[1]]);
        assert_eq!(
            arena.get(old_kids[1]).unwrap().effect_tag(),
            Some(EffectTag::Deletion)
        );

        let first = arena.children(wip).next().unwrap();
        let first = arena.get(first).unwrap();
        assert_eq!(first.dom(), Some(NodeHandle(10)));
        assert_eq!(first.alternate(), Some(old_kids[0]));
        assert_eq!(first.parent(), Some(wip));
    }

    #[test]
    fn trailing_old_fibers_are_all_deleted() {
        let mut arena = FiberArena::new();
        let (old_root, old_kids) = old_tree(&mut arena, &["li", "li", "li"]);
        let wip = wip_root(&mut arena, old_root);
        let mut deletions = Vec::new();

        reconcile_children(
            &mut arena,
            &mut deletions,
            wip,
            &[Element::new("li")],
            RenderGeneration(2),
        )
        .unwrap();

        assert_eq!(arena.children(wip).count(), 1);
        assert_eq!(deletions, vec![old_kids[1], old_kids[2]]);
    }

    #[test]
    fn empty_elements_delete_everything_and_leave_no_child() {
        let mut arena = FiberArena::new();
        let (old_root, old_kids) = old_tree(&mut arena, &["a", "b"]);
        let wip = wip_root(&mut arena, old_root);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, &[], RenderGeneration(2)).unwrap();

        assert_eq!(arena.get(wip).unwrap().child(), None);
        assert_eq!(deletions, old_kids);
    }

    #[test]
    fn text_and_tag_never_match() {
        let mut arena = FiberArena::new();
        let (old_root, _) = old_tree(&mut arena, &["span"]);
        let wip = wip_root(&mut arena, old_root);
        let mut deletions = Vec::new();

        let counts = reconcile_children(
            &mut arena,
            &mut deletions,
            wip,
            &[Element::text("span")],
            RenderGeneration(2),
        )
        .unwrap();

        assert_eq!(counts.placements, 1);
        assert_eq!(counts.deletions, 1);
    }

    #[test]
    fn no_alternate_places_everything() {
        let mut arena = FiberArena::new();
        let wip = arena.insert(Fiber::root(
            NodeHandle(1),
            Rc::new(Props::new()),
            None,
            RenderGeneration(1),
        ));
        let mut deletions = Vec::new();
        let counts = reconcile_children(
            &mut arena,
            &mut deletions,
            wip,
            &[Element::new("a"), Element::new("b")],
            RenderGeneration(1),
        )
        .unwrap();
        assert_eq!(counts.placements, 2);
        assert!(deletions.is_empty());
    }
}
