/// Saturating counters over the lifetime of a reconciler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders_requested: u64,
    pub units_performed: u64,
    pub slices: u64,
    pub yields: u64,
    pub commits: u64,
    pub placements: u64,
    pub updates: u64,
    pub deletions: u64,
    pub mutations_applied: u64,
    /// Generations dropped before commit, either by an error or because a
    /// newer render replaced them.
    pub aborted_generations: u64,
    /// Commits that failed partway and were undone.
    pub rolled_back_commits: u64,
}

pub(crate) fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}
