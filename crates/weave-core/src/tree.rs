//! Read-only view over a root's fibers.

use std::fmt;

use crate::collections::map::HashMap;
use crate::element::Key;
use crate::fiber::{FiberArena, FiberId, WorkTag};
use crate::flags::Flags;

/// Borrowed view of the committed generation, handed out by
/// [`Root::inspect`](crate::Root::inspect).
pub struct FiberTree<'a, I> {
    arena: &'a FiberArena<I>,
    root: FiberId,
}

impl<'a, I: Clone> FiberTree<'a, I> {
    pub(crate) fn new(arena: &'a FiberArena<I>, root: FiberId) -> Self {
        Self { arena, root }
    }

    pub fn root(&self) -> FiberId {
        self.root
    }

    pub fn contains(&self, fiber: FiberId) -> bool {
        self.arena.contains(fiber)
    }

    pub fn child(&self, fiber: FiberId) -> Option<FiberId> {
        self.arena.get(fiber)?.child
    }

    pub fn sibling(&self, fiber: FiberId) -> Option<FiberId> {
        self.arena.get(fiber)?.sibling
    }

    pub fn parent(&self, fiber: FiberId) -> Option<FiberId> {
        self.arena.get(fiber)?.parent
    }

    pub fn alternate(&self, fiber: FiberId) -> Option<FiberId> {
        self.arena.get(fiber)?.alternate
    }

    pub fn tag(&self, fiber: FiberId) -> Option<WorkTag> {
        self.arena.get(fiber).map(|node| node.tag)
    }

    pub fn key(&self, fiber: FiberId) -> Option<&Key> {
        self.arena.get(fiber)?.key.as_ref()
    }

    pub fn host_instance(&self, fiber: FiberId) -> Option<&I> {
        self.arena.get(fiber)?.state_node.as_ref()
    }

    pub fn flags(&self, fiber: FiberId) -> Flags {
        self.arena.get(fiber).map(|node| node.flags).unwrap_or_default()
    }

    pub fn subtree_flags(&self, fiber: FiberId) -> Flags {
        self.arena
            .get(fiber)
            .map(|node| node.subtree_flags)
            .unwrap_or_default()
    }

    /// Committed text of a HostText fiber.
    pub fn text(&self, fiber: FiberId) -> Option<&str> {
        self.arena.get(fiber)?.memoized.as_ref()?.text()
    }

    pub fn component_name(&self, fiber: FiberId) -> Option<&'static str> {
        self.arena.get(fiber)?.component_name()
    }

    pub fn host_tag(&self, fiber: FiberId) -> Option<&str> {
        self.arena.get(fiber)?.element_type.as_ref()?.host_tag()
    }

    /// The root fiber followed by every descendant, in pre-order.
    pub fn descendants(&self) -> Vec<FiberId> {
        self.arena.subtree(self.root)
    }

    /// `fiber` and everything below it, in pre-order.
    pub fn subtree(&self, fiber: FiberId) -> Vec<FiberId> {
        if self.arena.contains(fiber) {
            self.arena.subtree(fiber)
        } else {
            Vec::new()
        }
    }

    /// First fiber in pre-order satisfying `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Self, FiberId) -> bool) -> Option<FiberId> {
        self.descendants()
            .into_iter()
            .find(|&fiber| predicate(self, fiber))
    }

    /// Whether `a` and `b` are the same tree position in the two
    /// generations (identical or each other's alternate).
    pub fn same_unit(&self, a: FiberId, b: FiberId) -> bool {
        a == b || self.alternate(a) == Some(b)
    }
}

impl<I: Clone + fmt::Debug> fmt::Debug for FiberTree<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fiber in self.descendants() {
            let mut depth = 0;
            let mut cursor = self.parent(fiber);
            while let Some(parent) = cursor {
                depth += 1;
                if parent == self.root {
                    break;
                }
                cursor = self.parent(parent);
            }
            let node = &self.arena[fiber];
            let component: Option<&str> = node.component_name();
            let label = component
                .or_else(|| self.host_tag(fiber))
                .or_else(|| self.text(fiber))
                .unwrap_or("");
            writeln!(f, "{:indent$}{:?} {:?} {label}", "", fiber, node.tag, indent = depth * 2)?;
        }
        Ok(())
    }
}

/// Breach of the flag-bubbling invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagViolation {
    pub(crate) fiber: FiberId,
    pub(crate) recorded: Flags,
    pub(crate) computed: Flags,
}

impl fmt::Display for FlagViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fiber {:?} records subtree flags {:?} but its descendants carry {:?}",
            self.fiber, self.recorded, self.computed
        )
    }
}

/// Recomputes every subtree aggregate under `root` independently of the
/// completion walk and compares it with the recorded one.
pub(crate) fn verify_subtree_flags<I: Clone>(
    arena: &FiberArena<I>,
    root: FiberId,
) -> Result<(), FlagViolation> {
    // Reversed pre-order visits every fiber after all of its descendants.
    let mut below: HashMap<FiberId, Flags> = HashMap::new();
    for fiber in arena.subtree(root).into_iter().rev() {
        let computed = below.remove(&fiber).unwrap_or_default();
        let node = &arena[fiber];
        if node.subtree_flags != computed {
            return Err(FlagViolation {
                fiber,
                recorded: node.subtree_flags,
                computed,
            });
        }
        if fiber == root {
            break;
        }
        if let Some(parent) = node.parent {
            *below.entry(parent).or_default() |= node.flags | computed;
        }
    }
    Ok(())
}
