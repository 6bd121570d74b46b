#![allow(dead_code)]

use core_types::{NodeHandle, RenderGeneration};
use dom::{MemoryDom, OutputSnapshot};
use reconciler::{ReconcileError, Reconciler, Unbounded, UnitBudget, WorkLoopStatus};
use std::fmt;
use test_support::diff_snapshot_lines;
use vdom::Element;

/// How a render is split into slices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlicePlan {
    /// One slice, never yielding.
    Unbounded,
    /// Every slice allows `n` units.
    Fixed(usize),
    /// Slice sizes in order; the last size repeats.
    Sizes(Vec<usize>),
}

impl fmt::Display for SlicePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlicePlan::Unbounded => f.write_str("unbounded"),
            SlicePlan::Fixed(n) => write!(f, "fixed units={n}"),
            SlicePlan::Sizes(sizes) => write!(f, "sizes count={} sizes={sizes:?}", sizes.len()),
        }
    }
}

impl SlicePlan {
    pub fn random(seed: u64, slices: usize, max_units: usize) -> Self {
        let mut rng = Lcg::new(seed);
        SlicePlan::Sizes(
            (0..slices)
                .map(|_| 1 + rng.gen_range(max_units.max(1)))
                .collect(),
        )
    }

    fn slice_size(&self, slice: usize) -> Option<usize> {
        match self {
            SlicePlan::Unbounded => None,
            SlicePlan::Fixed(n) => Some(*n),
            SlicePlan::Sizes(sizes) => sizes.get(slice).or(sizes.last()).copied(),
        }
    }

    /// Drive the pending render until it commits. Returns the generation and
    /// the number of slices used.
    pub fn drive(
        &self,
        reconciler: &mut Reconciler<MemoryDom>,
    ) -> Result<(RenderGeneration, usize), ReconcileError> {
        let mut slice = 0;
        loop {
            let status = match self.slice_size(slice) {
                None => reconciler.work_loop(&Unbounded)?,
                Some(units) => reconciler.work_loop(&UnitBudget::new(units))?,
            };
            slice += 1;
            match status {
                WorkLoopStatus::Committed(generation) => return Ok((generation, slice)),
                WorkLoopStatus::Yielded => continue,
                WorkLoopStatus::Idle => panic!("no render pending under plan {self}"),
            }
        }
    }
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }
}

pub fn mount() -> (Reconciler<MemoryDom>, NodeHandle) {
    let mut dom = MemoryDom::new();
    let container = dom.create_root().unwrap();
    (Reconciler::new(dom), container)
}

pub fn render_sync(reconciler: &mut Reconciler<MemoryDom>, element: Element, container: NodeHandle) {
    reconciler.render(element, container);
    match reconciler.flush_sync() {
        Ok(WorkLoopStatus::Committed(_)) => {}
        other => panic!("render did not commit: {other:?}"),
    }
}

pub fn snapshot(reconciler: &Reconciler<MemoryDom>, container: NodeHandle) -> OutputSnapshot {
    OutputSnapshot::from_container(reconciler.adapter(), container)
}

pub fn assert_lines(expected: &[String], actual: &OutputSnapshot, context: &str) {
    let actual = actual.as_lines();
    assert!(
        expected == actual,
        "{context}: snapshot mismatch\n{}",
        diff_snapshot_lines(expected, actual)
    );
}

pub fn assert_matches_element(reconciler: &Reconciler<MemoryDom>, container: NodeHandle, element: &Element) {
    let expected = OutputSnapshot::from_element(element);
    assert_lines(expected.as_lines(), &snapshot(reconciler, container), "committed tree");
}

/// A table of `rows` rows, each with a label cell and a number cell. The
/// `tick` shifts labels so successive generations differ in text only.
pub fn table(rows: usize, tick: usize) -> Element {
    Element::new("table").prop("id", "grid").children(
        (0..rows)
            .map(|i| {
                Element::new("tr")
                    .prop("data-row", i as i64)
                    .child(Element::new("td").child(format!("row {}", i + tick)))
                    .child(Element::new("td").child((i * tick) as i64))
            })
            .collect::<Vec<_>>(),
    )
}
