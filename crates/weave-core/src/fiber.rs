//! Work units and the arena that owns both tree generations.
//!
//! Every fiber lives in a [`FiberArena`] and refers to its relatives by
//! [`FiberId`]. `alternate` is a symmetric one-hop link between the two
//! fibers that occupy the same tree position in the current and the
//! work-in-progress generation; it is never chained further.

use std::cell::RefCell;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::element::{Child, Element, ElementType, Key, Props};
use crate::flags::Flags;
use crate::hooks::Hook;
use crate::update_queue::UpdateQueue;

slotmap::new_key_type! {
    /// Stable handle to a fiber in its root's arena.
    pub struct FiberId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkTag {
    Root,
    HostComponent,
    HostText,
    FunctionComponent,
}

impl WorkTag {
    /// Whether fibers with this tag own a host instance.
    pub fn is_host(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostText)
    }
}

/// Pending or memoized input of a fiber.
#[derive(Clone, Debug)]
pub(crate) enum Payload {
    Props(Props),
    Text(Rc<str>),
}

impl Payload {
    pub(crate) fn props(&self) -> Option<&Props> {
        match self {
            Payload::Props(props) => Some(props),
            Payload::Text(_) => None,
        }
    }

    pub(crate) fn text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Props(_) => None,
        }
    }
}

/// `memoizedState`: the root's rendered description or a component's hooks.
#[derive(Clone, Default)]
pub(crate) enum FiberState {
    #[default]
    None,
    Root(Child),
    Hooks(Vec<Hook>),
}

pub(crate) type RootQueue = Rc<RefCell<UpdateQueue<Child>>>;

pub(crate) struct Fiber<I> {
    pub(crate) tag: WorkTag,
    pub(crate) key: Option<Key>,
    pub(crate) element_type: Option<ElementType>,
    pub(crate) pending: Payload,
    pub(crate) memoized: Option<Payload>,
    pub(crate) state: FiberState,
    pub(crate) state_node: Option<I>,

    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) index: usize,

    pub(crate) alternate: Option<FiberId>,
    pub(crate) flags: Flags,
    pub(crate) subtree_flags: Flags,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) update_queue: Option<RootQueue>,
}

impl<I> Fiber<I> {
    pub(crate) fn new(tag: WorkTag, pending: Payload, key: Option<Key>) -> Self {
        Self {
            tag,
            key,
            element_type: None,
            pending,
            memoized: None,
            state: FiberState::None,
            state_node: None,
            parent: None,
            child: None,
            sibling: None,
            index: 0,
            alternate: None,
            flags: Flags::empty(),
            subtree_flags: Flags::empty(),
            deletions: Vec::new(),
            update_queue: None,
        }
    }

    pub(crate) fn host_root() -> Self {
        let mut fiber = Self::new(WorkTag::Root, Payload::Props(Props::default()), None);
        fiber.state = FiberState::Root(Child::Empty);
        fiber.update_queue = Some(Rc::new(RefCell::new(UpdateQueue::new())));
        fiber
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        let tag = match element.element_type() {
            ElementType::Host(_) => WorkTag::HostComponent,
            ElementType::Component(_) => WorkTag::FunctionComponent,
        };
        let mut fiber = Self::new(
            tag,
            Payload::Props(element.props().clone()),
            element.key().cloned(),
        );
        fiber.element_type = Some(element.element_type().clone());
        fiber
    }

    pub(crate) fn from_text(content: Rc<str>) -> Self {
        Self::new(WorkTag::HostText, Payload::Text(content), None)
    }

    pub(crate) fn hooks(&self) -> &[Hook] {
        match &self.state {
            FiberState::Hooks(hooks) => hooks,
            _ => &[],
        }
    }

    pub(crate) fn component_name(&self) -> Option<&'static str> {
        self.element_type
            .as_ref()
            .and_then(ElementType::component)
            .map(|component| component.name())
    }
}

pub(crate) struct FiberArena<I> {
    slots: SlotMap<FiberId, Fiber<I>>,
}

impl<I: Clone> FiberArena<I> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<I>) -> FiberId {
        self.slots.insert(fiber)
    }

    pub(crate) fn get(&self, id: FiberId) -> Option<&Fiber<I>> {
        self.slots.get(id)
    }

    pub(crate) fn contains(&self, id: FiberId) -> bool {
        self.slots.contains_key(id)
    }

    pub(crate) fn remove(&mut self, id: FiberId) -> Option<Fiber<I>> {
        self.slots.remove(id)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(FiberId, &mut Fiber<I>) -> bool) {
        self.slots.retain(|id, fiber| keep(id, fiber));
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns the work-in-progress mirror of `current`, creating it on
    /// first use and otherwise resetting the existing alternate.
    pub(crate) fn create_work_in_progress(&mut self, current: FiberId, pending: Payload) -> FiberId {
        let wip = match self[current].alternate {
            Some(wip) => {
                let fiber = &mut self[wip];
                fiber.pending = pending;
                fiber.flags = Flags::empty();
                fiber.subtree_flags = Flags::empty();
                fiber.deletions.clear();
                wip
            }
            None => {
                let source = &self[current];
                let mut fiber = Fiber::new(source.tag, pending, source.key.clone());
                fiber.alternate = Some(current);
                let wip = self.insert(fiber);
                self[current].alternate = Some(wip);
                wip
            }
        };

        let source = &self[current];
        let element_type = source.element_type.clone();
        let update_queue = source.update_queue.clone();
        let child = source.child;
        let state = source.state.clone();
        let memoized = source.memoized.clone();
        let state_node = source.state_node.clone();

        let fiber = &mut self[wip];
        fiber.element_type = element_type;
        fiber.update_queue = update_queue;
        fiber.child = child;
        fiber.state = state;
        fiber.memoized = memoized;
        fiber.state_node = state_node;
        wip
    }

    /// Collects `root` and its descendants in pre-order.
    pub(crate) fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut visited = Vec::new();
        let mut node = root;
        loop {
            visited.push(node);
            if let Some(child) = self[node].child {
                node = child;
                continue;
            }
            if node == root {
                return visited;
            }
            loop {
                if let Some(sibling) = self[node].sibling {
                    node = sibling;
                    break;
                }
                match self[node].parent {
                    Some(parent) if parent != root => node = parent,
                    _ => return visited,
                }
            }
        }
    }
}

impl<I> Index<FiberId> for FiberArena<I> {
    type Output = Fiber<I>;

    fn index(&self, id: FiberId) -> &Self::Output {
        &self.slots[id]
    }
}

impl<I> IndexMut<FiberId> for FiberArena<I> {
    fn index_mut(&mut self, id: FiberId) -> &mut Self::Output {
        &mut self.slots[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_in_progress_is_paired_and_recycled() {
        let mut arena: FiberArena<u32> = FiberArena::new();
        let mut host = Fiber::new(WorkTag::HostText, Payload::Text("a".into()), None);
        host.state_node = Some(7);
        let current = arena.insert(host);

        let wip = arena.create_work_in_progress(current, Payload::Text("b".into()));
        assert_ne!(wip, current);
        assert_eq!(arena[wip].alternate, Some(current));
        assert_eq!(arena[current].alternate, Some(wip));
        assert_eq!(arena[wip].state_node, Some(7));
        assert_eq!(arena[wip].pending.text(), Some("b"));

        arena[wip].flags = Flags::UPDATE;
        arena[wip].subtree_flags = Flags::PLACEMENT;
        let again = arena.create_work_in_progress(current, Payload::Text("c".into()));
        assert_eq!(again, wip);
        assert!(arena[again].flags.is_empty());
        assert!(arena[again].subtree_flags.is_empty());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn subtree_walk_is_pre_order_and_bounded() {
        let mut arena: FiberArena<u32> = FiberArena::new();
        let outer = arena.insert(Fiber::host_root());
        let root = arena.insert(Fiber::new(WorkTag::HostComponent, Payload::Props(Props::new()), None));
        let a = arena.insert(Fiber::new(WorkTag::FunctionComponent, Payload::Props(Props::new()), None));
        let b = arena.insert(Fiber::from_text("b".into()));
        let sibling = arena.insert(Fiber::from_text("outside".into()));
        arena[outer].child = Some(root);
        arena[root].parent = Some(outer);
        arena[root].sibling = Some(sibling);
        arena[root].child = Some(a);
        arena[a].parent = Some(root);
        arena[a].child = Some(b);
        arena[b].parent = Some(a);

        assert_eq!(arena.subtree(root), vec![root, a, b]);
        assert_eq!(arena.subtree(b), vec![b]);
    }
}
