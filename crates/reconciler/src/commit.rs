//! Commit planning.
//!
//! A finished work-in-progress tree is turned into an ordered mutation list
//! before anything touches the output tree. Every structural check happens
//! while planning, so a corrupted fiber tree is reported without mutating
//! the wrong node.
//!
//! Ordering:
//! - all queued deletions first, in the order they were discovered;
//! - then the finished tree in pre-order (a fiber before its children,
//!   children before later siblings), starting below the root.
//!
//! Descendants are visited whatever their ancestor's own tag, so an
//! unchanged wrapper still commits its changed children.
//!
//! When the adapter fails partway through a commit, `plan_rollback` turns the
//! applied prefix back into the committed tree.

use crate::error::InvariantViolation;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};
use crate::props::{diff_props, is_plain};
use core_types::{NodeHandle, RenderGeneration};
use dom::Mutation;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of one commit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitSummary {
    pub generation: RenderGeneration,
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Every mutation of the commit, in application order.
    pub mutations: Vec<Mutation>,
}

impl CommitSummary {
    /// True when the commit changed nothing in the output tree.
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }
}

pub(crate) fn plan_commit(
    arena: &FiberArena,
    wip_root: FiberId,
    deletions: &[FiberId],
    generation: RenderGeneration,
) -> Result<CommitSummary, InvariantViolation> {
    let mut summary = CommitSummary {
        generation,
        ..CommitSummary::default()
    };

    for &id in deletions {
        commit_deletion(arena, id, &mut summary)?;
    }

    let root = arena
        .get(wip_root)
        .ok_or(InvariantViolation::MissingFiber(wip_root))?;
    let mut cursor = root.child;
    while let Some(id) = cursor {
        commit_work(arena, id, &mut summary)?;
        cursor = arena.next_in_walk(id);
    }
    Ok(summary)
}

fn commit_deletion(
    arena: &FiberArena,
    id: FiberId,
    summary: &mut CommitSummary,
) -> Result<(), InvariantViolation> {
    let fiber = arena.get(id).ok_or(InvariantViolation::MissingFiber(id))?;
    let child = fiber.dom.ok_or(InvariantViolation::DeletionWithoutDom(id))?;
    let parent = nearest_ancestor_dom(arena, id)?;
    summary.mutations.push(Mutation::RemoveChild { parent, child });
    summary.deletions += 1;
    Ok(())
}

fn commit_work(
    arena: &FiberArena,
    id: FiberId,
    summary: &mut CommitSummary,
) -> Result<(), InvariantViolation> {
    let fiber = arena.get(id).ok_or(InvariantViolation::MissingFiber(id))?;
    match fiber.effect_tag {
        Some(EffectTag::Placement) => {
            summary.placements += 1;
            if let Some(child) = fiber.dom {
                let parent = nearest_ancestor_dom(arena, id)?;
                summary.mutations.push(Mutation::AppendChild { parent, child });
            }
        }
        Some(EffectTag::Update) => {
            summary.updates += 1;
            let alternate_id = fiber
                .alternate
                .ok_or(InvariantViolation::UpdateWithoutAlternate(id))?;
            let alternate = arena
                .get(alternate_id)
                .ok_or(InvariantViolation::MissingFiber(alternate_id))?;
            if let Some(node) = fiber.dom {
                diff_props(&alternate.props, &fiber.props, node, &mut summary.mutations);
            }
        }
        Some(EffectTag::Deletion) => return Err(InvariantViolation::DeletionInWorkTree(id)),
        None => {}
    }
    Ok(())
}

/// Output node of the closest ancestor that owns one.
fn nearest_ancestor_dom(arena: &FiberArena, id: FiberId) -> Result<NodeHandle, InvariantViolation> {
    let fiber = arena.get(id).ok_or(InvariantViolation::MissingFiber(id))?;
    let mut cursor = fiber.parent.ok_or(InvariantViolation::MissingParent(id))?;
    loop {
        let ancestor = arena
            .get(cursor)
            .ok_or(InvariantViolation::MissingFiber(cursor))?;
        if let Some(dom) = ancestor.dom {
            return Ok(dom);
        }
        cursor = ancestor
            .parent
            .ok_or(InvariantViolation::NoAncestorDom(id))?;
    }
}

/// Mutations that undo `applied`, the prefix of a commit that the adapter
/// accepted before failing, so the output shows `committed_root` again.
///
/// Property, listener and placement changes are inverted in reverse order.
/// The adapter can only append, so a removed node cannot simply be put back:
/// every parent that lost children has its child list rebuilt from the first
/// removed position onward. Removals always lead a commit, so by the time the
/// rebuild runs every placement under that parent is already undone.
pub(crate) fn plan_rollback(
    arena: &FiberArena,
    committed_root: Option<FiberId>,
    applied: &[Mutation],
) -> Vec<Mutation> {
    let owners = committed_nodes(arena, committed_root);
    let mut undo = Vec::with_capacity(applied.len());
    let mut removed = Vec::new();

    for mutation in applied.iter().rev() {
        let inverse = match mutation {
            Mutation::RemoveChild { parent, child } => {
                removed.push((*parent, *child));
                continue;
            }
            Mutation::AppendChild { parent, child } => Mutation::RemoveChild {
                parent: *parent,
                child: *child,
            },
            Mutation::SetProperty { node, name, .. } | Mutation::RemoveProperty { node, name } => {
                let previous = owners
                    .get(node)
                    .and_then(|&id| arena.get(id))
                    .and_then(|fiber| fiber.props.get(name))
                    .filter(|value| is_plain(name, value));
                match previous {
                    Some(value) => Mutation::SetProperty {
                        node: *node,
                        name: Arc::clone(name),
                        value: value.clone(),
                    },
                    None => Mutation::RemoveProperty {
                        node: *node,
                        name: Arc::clone(name),
                    },
                }
            }
            Mutation::AddListener {
                node,
                event,
                handler,
            } => Mutation::RemoveListener {
                node: *node,
                event: Arc::clone(event),
                handler: handler.clone(),
            },
            Mutation::RemoveListener {
                node,
                event,
                handler,
            } => Mutation::AddListener {
                node: *node,
                event: Arc::clone(event),
                handler: handler.clone(),
            },
        };
        undo.push(inverse);
    }

    removed.reverse();
    let mut parents: Vec<NodeHandle> = Vec::new();
    for (parent, _) in &removed {
        if !parents.contains(parent) {
            parents.push(*parent);
        }
    }
    for parent in parents {
        let gone: Vec<NodeHandle> = removed
            .iter()
            .filter(|(p, _)| *p == parent)
            .map(|(_, child)| *child)
            .collect();
        let committed: Vec<NodeHandle> = owners
            .get(&parent)
            .map(|&id| {
                arena
                    .children(id)
                    .filter_map(|kid| arena.get(kid).and_then(Fiber::dom))
                    .collect()
            })
            .unwrap_or_default();
        let tail = match committed.iter().position(|kid| gone.contains(kid)) {
            Some(first) => &committed[first..],
            None => {
                log::warn!(
                    target: "reconciler.commit",
                    "rollback: node {} is not in the committed tree; re-appending removed children",
                    parent.0
                );
                &gone[..]
            }
        };
        for kid in tail {
            if !gone.contains(kid) {
                undo.push(Mutation::RemoveChild { parent, child: *kid });
            }
        }
        for kid in tail {
            undo.push(Mutation::AppendChild { parent, child: *kid });
        }
    }
    undo
}

/// Output node of every fiber in a committed tree, mapped back to its fiber.
fn committed_nodes(arena: &FiberArena, root: Option<FiberId>) -> HashMap<NodeHandle, FiberId> {
    let mut owners = HashMap::new();
    let mut cursor = root;
    while let Some(id) = cursor {
        if let Some(dom) = arena.get(id).and_then(Fiber::dom) {
            owners.insert(dom, id);
        }
        cursor = arena.next_in_walk(id);
    }
    owners
}
