/// Opaque identity of a node in the output tree.
///
/// Handles are allocated by the output adapter and are never reused within
/// one output tree, so a stale handle can be detected instead of silently
/// aliasing a newer node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u32);

impl NodeHandle {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeHandle = NodeHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Monotonic counter identifying one render generation (one `render` call
/// through its matching commit).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderGeneration(pub u64);

impl RenderGeneration {
    pub const INITIAL: RenderGeneration = RenderGeneration(0);

    pub fn next(self) -> Self {
        RenderGeneration(self.0.wrapping_add(1))
    }
}
