//! Effect flags recorded on fibers during reconciliation.

use bitflags::bitflags;

bitflags! {
    /// Mutations a fiber asks the commit phase to perform.
    ///
    /// Every fiber carries its own flags plus the union of its descendants'
    /// flags (`subtree_flags`), which lets the commit walk skip clean subtrees.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Insert the fiber's host instance(s) into the nearest host parent.
        const PLACEMENT = 1 << 0;
        /// Push already computed prop or text changes onto the live instance.
        const UPDATE = 1 << 1;
        /// One or more children queued in `deletions` must be removed.
        const CHILD_DELETION = 1 << 2;
    }
}

/// Flags that the mutation commit walk cares about.
pub const MUTATION_MASK: Flags = Flags::PLACEMENT
    .union(Flags::UPDATE)
    .union(Flags::CHILD_DELETION);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_mask_covers_every_flag() {
        assert_eq!(MUTATION_MASK, Flags::all());
        assert!(Flags::UPDATE.intersects(MUTATION_MASK));
        assert!(!Flags::empty().intersects(MUTATION_MASK));
    }
}
