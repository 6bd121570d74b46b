use crate::commit::{CommitSummary, plan_commit, plan_rollback};
use crate::config::ReconcilerConfig;
use crate::error::{InvariantViolation, ReconcileError};
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::props::initial_props;
use crate::reconcile::reconcile_children;
use crate::scheduler::{Deadline, IdleHost, Unbounded, WorkLoopStatus};
use crate::stats::{RenderStats, bump};
use core_types::{NodeHandle, RenderGeneration};
use dom::{OutputAdapter, apply_mutations};
use std::collections::BTreeMap;
use std::rc::Rc;
use vdom::{Element, Props};

/// Incremental renderer driving one output adapter.
///
/// All render state lives here: the committed fiber tree of every container
/// rendered into, the tree under construction, the pending deletions and the
/// next unit of work. Calls take `&mut self`, so a render can never re-enter
/// itself.
#[derive(Debug)]
pub struct Reconciler<A: OutputAdapter> {
    adapter: A,
    config: ReconcilerConfig,
    arena: FiberArena,
    current_roots: BTreeMap<NodeHandle, FiberId>,
    wip_root: Option<FiberId>,
    deletions: Vec<FiberId>,
    next_unit_of_work: Option<FiberId>,
    generation: RenderGeneration,
    stats: RenderStats,
    last_commit: Option<CommitSummary>,
}

impl<A: OutputAdapter> Reconciler<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, ReconcilerConfig::default())
    }

    pub fn with_config(adapter: A, config: ReconcilerConfig) -> Self {
        Self {
            adapter,
            config,
            arena: FiberArena::new(),
            current_roots: BTreeMap::new(),
            wip_root: None,
            deletions: Vec::new(),
            next_unit_of_work: None,
            generation: RenderGeneration::INITIAL,
            stats: RenderStats::default(),
            last_commit: None,
        }
    }

    /// Start rendering `element` as the only child of `container`.
    ///
    /// Nothing is diffed or mutated here; the work happens in [`work_loop`].
    /// A render still in flight is discarded and restarted from the last
    /// committed tree. Each container keeps its own committed tree, so the
    /// new tree is diffed against whatever was last committed into
    /// `container`, and built from scratch the first time.
    ///
    /// [`work_loop`]: Reconciler::work_loop
    pub fn render(&mut self, element: Element, container: NodeHandle) {
        if self.wip_root.is_some() {
            log::warn!(
                target: "reconciler.render",
                "render requested while generation {} is in flight; restarting",
                self.generation.0
            );
            self.discard_wip();
        }

        self.generation = self.generation.next();
        let alternate = self.current_roots.get(&container).copied();
        let props = Rc::new(Props::with_children(vec![element]));
        let root = self
            .arena
            .insert(Fiber::root(container, props, alternate, self.generation));

        self.wip_root = Some(root);
        self.deletions.clear();
        self.next_unit_of_work = Some(root);
        bump(&mut self.stats.renders_requested, 1);
        log::debug!(
            target: "reconciler.render",
            "generation {} requested into container {} (incremental: {})",
            self.generation.0,
            container.0,
            alternate.is_some()
        );
    }

    /// Perform units of work until `deadline` runs low, committing the
    /// render if it completes within this slice.
    ///
    /// The first unit of a slice always runs. On error the in-flight
    /// generation is discarded and the previously committed tree stays
    /// current.
    pub fn work_loop(&mut self, deadline: &impl Deadline) -> Result<WorkLoopStatus, ReconcileError> {
        let Some(wip_root) = self.wip_root else {
            return Ok(WorkLoopStatus::Idle);
        };
        bump(&mut self.stats.slices, 1);

        let mut units = 0usize;
        while let Some(unit) = self.next_unit_of_work {
            let next = match self.perform_unit_of_work(unit) {
                Ok(next) => next,
                Err(err) => {
                    log::warn!(
                        target: "reconciler.work_loop",
                        "generation {} aborted during render: {err}",
                        self.generation.0
                    );
                    self.discard_wip();
                    return Err(err);
                }
            };
            self.next_unit_of_work = next;
            units += 1;
            if next.is_none() {
                break;
            }
            let capped = self
                .config
                .max_units_per_slice
                .is_some_and(|max| units >= max);
            if capped || deadline.time_remaining() < self.config.yield_threshold {
                bump(&mut self.stats.yields, 1);
                log::trace!(
                    target: "reconciler.work_loop",
                    "yield after {units} units (capped: {capped})"
                );
                return Ok(WorkLoopStatus::Yielded);
            }
        }

        log::trace!(target: "reconciler.work_loop", "render finished after {units} units");
        let generation = self.commit_root(wip_root)?;
        Ok(WorkLoopStatus::Committed(generation))
    }

    /// Run the pending render to completion in a single slice.
    pub fn flush_sync(&mut self) -> Result<WorkLoopStatus, ReconcileError> {
        self.work_loop(&Unbounded)
    }

    /// Call the work loop once per idle period until the host shuts down.
    ///
    /// Idle periods keep being consumed after the commit, so with a host that
    /// never shuts down (a `FrameHost` without a frame limit) this does not
    /// return; use [`run_until_committed`] to stop at the commit instead.
    /// Returns the last commit made while driving the host, if any.
    ///
    /// [`run_until_committed`]: Reconciler::run_until_committed
    pub fn run_idle<H: IdleHost>(
        &mut self,
        host: &mut H,
    ) -> Result<Option<RenderGeneration>, ReconcileError> {
        let mut committed = None;
        while let Some(deadline) = host.next_idle_period() {
            if let WorkLoopStatus::Committed(generation) = self.work_loop(&deadline)? {
                committed = Some(generation);
            }
        }
        Ok(committed)
    }

    /// Call the work loop once per idle period while a render is in flight.
    ///
    /// Returns the committed generation, or `None` when nothing was rendering
    /// or the host shut down before the commit.
    pub fn run_until_committed<H: IdleHost>(
        &mut self,
        host: &mut H,
    ) -> Result<Option<RenderGeneration>, ReconcileError> {
        while self.is_rendering() {
            let Some(deadline) = host.next_idle_period() else {
                break;
            };
            if let WorkLoopStatus::Committed(generation) = self.work_loop(&deadline)? {
                return Ok(Some(generation));
            }
        }
        Ok(None)
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, ReconcileError> {
        let fiber = self
            .arena
            .get(id)
            .ok_or(InvariantViolation::MissingFiber(id))?;

        if fiber.dom.is_none() {
            let ty = fiber
                .ty
                .clone()
                .ok_or(InvariantViolation::UntypedFiber(id))?;
            let props = Rc::clone(&fiber.props);
            let node = self.adapter.create_node(&ty)?;
            let init = initial_props(&props, node);
            let applied = apply_mutations(&mut self.adapter, &init);
            let count = match applied {
                Ok(count) => count,
                Err((count, err)) => {
                    bump(&mut self.stats.mutations_applied, count as u64);
                    return Err(err.into());
                }
            };
            bump(&mut self.stats.mutations_applied, count as u64);
            self.arena
                .get_mut(id)
                .ok_or(InvariantViolation::MissingFiber(id))?
                .dom = Some(node);
        }

        let props = Rc::clone(
            &self
                .arena
                .get(id)
                .ok_or(InvariantViolation::MissingFiber(id))?
                .props,
        );
        reconcile_children(
            &mut self.arena,
            &mut self.deletions,
            id,
            props.children(),
            self.generation,
        )?;
        bump(&mut self.stats.units_performed, 1);
        Ok(self.arena.next_in_walk(id))
    }

    fn commit_root(&mut self, wip_root: FiberId) -> Result<RenderGeneration, ReconcileError> {
        let generation = self.generation;
        let planned = self
            .arena
            .get(wip_root)
            .and_then(Fiber::dom)
            .ok_or(InvariantViolation::MissingFiber(wip_root))
            .and_then(|container| {
                plan_commit(&self.arena, wip_root, &self.deletions, generation)
                    .map(|summary| (container, summary))
            });
        let (container, summary) = match planned {
            Ok(planned) => planned,
            Err(err) => {
                log::warn!(
                    target: "reconciler.commit",
                    "generation {} not committed: {err}",
                    generation.0
                );
                self.discard_wip();
                return Err(err.into());
            }
        };

        if let Err((applied, err)) = apply_mutations(&mut self.adapter, &summary.mutations) {
            bump(&mut self.stats.mutations_applied, applied as u64);
            log::warn!(
                target: "reconciler.commit",
                "generation {} failed after {applied} of {} mutations: {err}",
                generation.0,
                summary.mutations.len()
            );
            let committed = self.current_roots.get(&container).copied();
            let undo = plan_rollback(&self.arena, committed, &summary.mutations[..applied]);
            let rolled_back = apply_mutations(&mut self.adapter, &undo);
            self.discard_wip();
            return match rolled_back {
                Ok(count) => {
                    bump(&mut self.stats.mutations_applied, count as u64);
                    bump(&mut self.stats.rolled_back_commits, 1);
                    log::debug!(
                        target: "reconciler.commit",
                        "generation {} rolled back with {count} mutations",
                        generation.0
                    );
                    Err(err.into())
                }
                Err((count, rollback)) => {
                    bump(&mut self.stats.mutations_applied, count as u64);
                    log::error!(
                        target: "reconciler.commit",
                        "generation {} rollback failed after {count} of {} mutations: {rollback}",
                        generation.0,
                        undo.len()
                    );
                    Err(ReconcileError::RollbackFailed {
                        commit: err,
                        rollback,
                    })
                }
            };
        }

        let stats = &mut self.stats;
        bump(&mut stats.commits, 1);
        bump(&mut stats.placements, summary.placements as u64);
        bump(&mut stats.updates, summary.updates as u64);
        bump(&mut stats.deletions, summary.deletions as u64);
        bump(&mut stats.mutations_applied, summary.mutations.len() as u64);

        let replaced = self.current_roots.insert(container, wip_root);
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.clear();
        let swept = replaced.map_or(0, |old| self.arena.remove_tree(old));

        log::debug!(
            target: "reconciler.commit",
            "generation {} committed: +{} ~{} -{} ({} mutations, {swept} fibers swept)",
            generation.0,
            summary.placements,
            summary.updates,
            summary.deletions,
            summary.mutations.len()
        );
        self.last_commit = Some(summary);
        Ok(generation)
    }

    /// Drop the tree under construction. Fibers queued for deletion belong to
    /// the committed tree and only lose their tag.
    fn discard_wip(&mut self) {
        if self.wip_root.take().is_none() {
            return;
        }
        for id in self.deletions.drain(..) {
            if let Some(fiber) = self.arena.get_mut(id) {
                fiber.effect_tag = None;
            }
        }
        self.next_unit_of_work = None;
        let removed = self.arena.remove_generation(self.generation);
        bump(&mut self.stats.aborted_generations, 1);
        log::debug!(
            target: "reconciler.render",
            "generation {} discarded ({removed} fibers)",
            self.generation.0
        );
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// True between `render` and the matching commit (or abort).
    pub fn is_rendering(&self) -> bool {
        self.wip_root.is_some()
    }

    /// Root of the tree last committed into `container`.
    pub fn current_root(&self, container: NodeHandle) -> Option<FiberId> {
        self.current_roots.get(&container).copied()
    }

    /// Containers holding a committed tree, in handle order.
    pub fn containers(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.current_roots.keys().copied()
    }

    pub fn fiber(&self, id: FiberId) -> Option<&Fiber> {
        self.arena.get(id)
    }

    pub fn fibers(&self) -> &FiberArena {
        &self.arena
    }

    /// Generation of the most recent `render` call.
    pub fn generation(&self) -> RenderGeneration {
        self.generation
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn last_commit(&self) -> Option<&CommitSummary> {
        self.last_commit.as_ref()
    }
}
