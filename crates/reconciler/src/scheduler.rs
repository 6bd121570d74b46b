//! Host scheduling seams.
//!
//! The reconciler never decides when it runs. A host hands it idle periods,
//! each bounded by a [`Deadline`]; the work loop performs units of work until
//! the deadline runs low and then returns control.

use core_types::RenderGeneration;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time left in the current idle period.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

impl<D: Deadline + ?Sized> Deadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }
}

/// Wall-clock deadline ending at a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct InstantDeadline {
    end: Instant,
}

impl InstantDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    pub fn at(end: Instant) -> Self {
        Self { end }
    }
}

impl Deadline for InstantDeadline {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// A deadline that never runs out; drives a render to completion in one slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deterministic deadline allowing exactly `units` units of work.
///
/// The work loop asks for the remaining time once after every unit, so each
/// query consumes one unit. A budget of zero behaves like one: the first unit
/// of a slice always runs.
#[derive(Debug)]
pub struct UnitBudget {
    remaining: Cell<usize>,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units.max(1)),
        }
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1)
        }
    }
}

/// Source of idle periods. `None` means the host is shutting down.
pub trait IdleHost {
    type Deadline: Deadline;

    fn next_idle_period(&mut self) -> Option<Self::Deadline>;
}

/// Host handing out back-to-back wall-clock frames of a fixed budget.
#[derive(Clone, Debug)]
pub struct FrameHost {
    budget: Duration,
    frames_left: Option<usize>,
}

impl FrameHost {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            frames_left: None,
        }
    }

    /// Stop after `frames` idle periods.
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frames_left = Some(frames);
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl IdleHost for FrameHost {
    type Deadline = InstantDeadline;

    fn next_idle_period(&mut self) -> Option<InstantDeadline> {
        if let Some(left) = self.frames_left.as_mut() {
            if *left == 0 {
                return None;
            }
            *left -= 1;
        }
        Some(InstantDeadline::new(self.budget))
    }
}

/// Host replaying a fixed list of slice sizes, in units of work.
#[derive(Clone, Debug)]
pub struct ScriptedHost {
    slices: std::vec::IntoIter<usize>,
}

impl ScriptedHost {
    pub fn new(slices: impl Into<Vec<usize>>) -> Self {
        Self {
            slices: slices.into().into_iter(),
        }
    }
}

impl IdleHost for ScriptedHost {
    type Deadline = UnitBudget;

    fn next_idle_period(&mut self) -> Option<UnitBudget> {
        self.slices.next().map(UnitBudget::new)
    }
}

/// What one call of the work loop achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkLoopStatus {
    /// Nothing to do.
    Idle,
    /// Work remains; call again in the next idle period.
    Yielded,
    /// The render finished and this generation is now visible.
    Committed(RenderGeneration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_runs_dry_after_n_queries() {
        let budget = UnitBudget::new(3);
        assert!(budget.time_remaining() > Duration::ZERO);
        assert!(budget.time_remaining() > Duration::ZERO);
        assert_eq!(budget.time_remaining(), Duration::ZERO);
        assert_eq!(budget.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn zero_unit_budget_still_allows_one_unit() {
        let budget = UnitBudget::new(0);
        assert_eq!(budget.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn frame_host_stops_at_limit() {
        let mut host = FrameHost::new(Duration::from_millis(4)).with_frame_limit(2);
        assert!(host.next_idle_period().is_some());
        assert!(host.next_idle_period().is_some());
        assert!(host.next_idle_period().is_none());
    }

    #[test]
    fn expired_instant_deadline_reports_zero() {
        let deadline = InstantDeadline::at(Instant::now());
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn scripted_host_replays_slices() {
        let mut host = ScriptedHost::new(vec![2, 1]);
        assert!(host.next_idle_period().is_some());
        assert!(host.next_idle_period().is_some());
        assert!(host.next_idle_period().is_none());
    }
}
