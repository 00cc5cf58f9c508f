//! Applies a finished generation's flags to the host tree.

use std::mem;

use crate::fiber::{FiberArena, FiberId, WorkTag};
use crate::flags::{Flags, MUTATION_MASK};
use crate::host::Host;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Placement,
    Update,
    Deletion,
}

/// One host mutation applied during a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub fiber: FiberId,
    pub tag: WorkTag,
    pub kind: MutationKind,
}

/// Record of the mutations the most recent commit applied, in commit order.
///
/// Deletions name the removed fiber, which is no longer in the tree once the
/// commit returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    mutations: Vec<Mutation>,
}

impl CommitSummary {
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn placements(&self) -> impl Iterator<Item = &Mutation> {
        self.of_kind(MutationKind::Placement)
    }

    pub fn updates(&self) -> impl Iterator<Item = &Mutation> {
        self.of_kind(MutationKind::Update)
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Mutation> {
        self.of_kind(MutationKind::Deletion)
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    fn of_kind(&self, kind: MutationKind) -> impl Iterator<Item = &Mutation> {
        self.mutations
            .iter()
            .filter(move |mutation| mutation.kind == kind)
    }

    fn record(&mut self, fiber: FiberId, tag: WorkTag, kind: MutationKind) {
        self.mutations.push(Mutation { fiber, tag, kind });
    }
}

/// Borrowed state for one commit.
pub(crate) struct CommitContext<'a, H: Host> {
    pub(crate) arena: &'a mut FiberArena<H::Instance>,
    pub(crate) host: &'a mut H,
    pub(crate) container: &'a H::Instance,
    pub(crate) summary: CommitSummary,
}

impl<H: Host> CommitContext<'_, H> {
    /// Walks `finished` depth first, descending only into subtrees whose
    /// aggregate flags intersect the mutation mask.
    pub(crate) fn commit_mutation_effects(&mut self, finished: FiberId) {
        let mut next = Some(finished);
        while let Some(mut node) = next {
            let fiber = &self.arena[node];
            if fiber.subtree_flags.intersects(MUTATION_MASK) {
                if let Some(child) = fiber.child {
                    next = Some(child);
                    continue;
                }
            }

            loop {
                self.commit_mutation_effects_on_fiber(node);
                if node == finished {
                    next = None;
                    break;
                }
                if let Some(sibling) = self.arena[node].sibling {
                    next = Some(sibling);
                    break;
                }
                match self.arena[node].parent {
                    Some(parent) => node = parent,
                    None => {
                        next = None;
                        break;
                    }
                }
            }
        }
    }

    fn commit_mutation_effects_on_fiber(&mut self, fiber: FiberId) {
        let flags = self.arena[fiber].flags;
        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(fiber);
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(fiber);
        }
        if flags.contains(Flags::CHILD_DELETION) {
            let deletions = mem::take(&mut self.arena[fiber].deletions);
            for deleted in deletions {
                self.commit_deletion(deleted);
            }
        }
        let node = &mut self.arena[fiber];
        node.flags = Flags::empty();
        node.subtree_flags = Flags::empty();
    }

    fn commit_placement(&mut self, fiber: FiberId) {
        let Some(parent) = self.host_parent(fiber) else {
            log::warn!("no host parent for placed fiber {fiber:?}; skipping placement");
            return;
        };
        self.append_placement_node(fiber, &parent);
        self.summary
            .record(fiber, self.arena[fiber].tag, MutationKind::Placement);
    }

    fn append_placement_node(&mut self, fiber: FiberId, parent: &H::Instance) {
        let node = &self.arena[fiber];
        if node.tag.is_host() {
            if let Some(instance) = node.state_node.as_ref() {
                if let Err(err) = self.host.append_child_to_container(parent, instance) {
                    log::error!("failed to insert {instance:?} into {parent:?}: {err}");
                }
            }
            return;
        }
        let mut child = node.child;
        while let Some(id) = child {
            self.append_placement_node(id, parent);
            child = self.arena[id].sibling;
        }
    }

    fn commit_update(&mut self, fiber: FiberId) {
        let node = &self.arena[fiber];
        let Some(instance) = node.state_node.as_ref() else {
            log::warn!("update flagged on {fiber:?} without a host instance");
            return;
        };
        let result = match node.tag {
            WorkTag::HostText => {
                let text = node.pending.text().unwrap_or_default();
                self.host.commit_text_update(instance, text)
            }
            WorkTag::HostComponent => match node.pending.props() {
                Some(props) => self.host.commit_instance_update(instance, props),
                None => return,
            },
            WorkTag::Root | WorkTag::FunctionComponent => return,
        };
        match result {
            Ok(()) => self.summary.record(fiber, node.tag, MutationKind::Update),
            Err(err) => log::error!("failed to update {instance:?}: {err}"),
        }
    }

    /// Removes the root-most host instance of the deleted subtree and
    /// releases every fiber in it.
    fn commit_deletion(&mut self, deleted: FiberId) {
        if !self.arena.contains(deleted) {
            log::warn!("deleted fiber {deleted:?} is already released");
            return;
        }
        let subtree = self.arena.subtree(deleted);
        let host_root = subtree.iter().copied().find(|&id| {
            let fiber = &self.arena[id];
            fiber.tag.is_host() && fiber.state_node.is_some()
        });

        if let Some(host_root) = host_root {
            match self.host_parent(deleted) {
                Some(parent) => {
                    if let Some(instance) = self.arena[host_root].state_node.as_ref() {
                        if let Err(err) = self.host.remove_child(instance, &parent) {
                            log::error!("failed to remove {instance:?} from {parent:?}: {err}");
                        }
                    }
                }
                None => log::warn!("no host parent for deleted fiber {deleted:?}; skipping removal"),
            }
        }
        self.summary
            .record(deleted, self.arena[deleted].tag, MutationKind::Deletion);

        let node = &mut self.arena[deleted];
        node.parent = None;
        node.child = None;
        for id in subtree {
            if let Some(fiber) = self.arena.remove(id) {
                if let Some(alternate) = fiber.alternate {
                    self.arena.remove(alternate);
                }
            }
        }
    }

    /// Nearest host-capable ancestor of `fiber`, resolved to an instance.
    fn host_parent(&self, fiber: FiberId) -> Option<H::Instance> {
        let mut parent = self.arena[fiber].parent;
        while let Some(id) = parent {
            let node = &self.arena[id];
            match node.tag {
                WorkTag::HostComponent | WorkTag::HostText => return node.state_node.clone(),
                WorkTag::Root => return Some(self.container.clone()),
                WorkTag::FunctionComponent => parent = node.parent,
            }
        }
        None
    }
}
