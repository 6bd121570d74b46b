//! Incremental fiber reconciler.
//!
//! `render` records a new element tree; `work_loop` turns it into fibers one
//! unit at a time, diffing each element's children against the fibers of the
//! last committed tree, and yields whenever the host's deadline runs low.
//! Once every unit is done the accumulated mutations are applied to the
//! output tree in one commit, so the output only ever shows complete
//! generations.
//!
//! ```
//! use dom::{MemoryDom, OutputSnapshot};
//! use reconciler::{Reconciler, WorkLoopStatus};
//! use vdom::Element;
//!
//! let mut dom = MemoryDom::new();
//! let container = dom.create_root().unwrap();
//! let mut reconciler = Reconciler::new(dom);
//!
//! reconciler.render(Element::new("p").child("hi"), container);
//! let status = reconciler.flush_sync().unwrap();
//! assert!(matches!(status, WorkLoopStatus::Committed(_)));
//! assert_eq!(
//!     OutputSnapshot::from_container(reconciler.adapter(), container).render(),
//!     "<p>\n  \"hi\"",
//! );
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod fiber;
pub mod props;
pub mod reconcile;
pub mod scheduler;
pub mod stats;

mod engine;

pub use commit::CommitSummary;
pub use config::ReconcilerConfig;
pub use engine::Reconciler;
pub use error::{InvariantViolation, ReconcileError};
pub use fiber::{EffectTag, Fiber, FiberArena, FiberId};
pub use props::{diff_props, initial_props};
pub use reconcile::ReconcileCounts;
pub use scheduler::{
    Deadline, FrameHost, IdleHost, InstantDeadline, ScriptedHost, Unbounded, UnitBudget,
    WorkLoopStatus,
};
pub use stats::RenderStats;
