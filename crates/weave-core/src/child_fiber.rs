//! Single-child reconciliation.

use std::rc::Rc;

use crate::element::{Child, Element};
use crate::fiber::{Fiber, FiberArena, FiberId, Payload, WorkTag};
use crate::flags::Flags;

/// Diffs one child description against the previous child fiber.
///
/// With `track_effects` off (the parent is mounting and has no alternate)
/// no Placement or deletion is recorded: the parent's whole subtree is
/// inserted at once by its placed ancestor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ChildReconciler {
    track_effects: bool,
}

pub(crate) const RECONCILE_CHILD_FIBERS: ChildReconciler = ChildReconciler {
    track_effects: true,
};

pub(crate) const MOUNT_CHILD_FIBERS: ChildReconciler = ChildReconciler {
    track_effects: false,
};

impl ChildReconciler {
    pub(crate) fn reconcile<I: Clone>(
        self,
        arena: &mut FiberArena<I>,
        parent: FiberId,
        current_first: Option<FiberId>,
        new_child: &Child,
    ) -> Option<FiberId> {
        match new_child {
            Child::Element(element) => {
                let fiber = self.reconcile_single_element(arena, parent, current_first, element);
                Some(self.place_single_child(arena, fiber))
            }
            Child::Text(content) => {
                let fiber =
                    self.reconcile_single_text_node(arena, parent, current_first, content);
                Some(self.place_single_child(arena, fiber))
            }
            Child::Empty => {
                self.delete_remaining(arena, parent, current_first);
                None
            }
            Child::List(children) => {
                log::warn!(
                    "fiber {parent:?} rendered a list of {} children; only single children are reconciled",
                    children.len()
                );
                self.delete_remaining(arena, parent, current_first);
                None
            }
        }
    }

    fn reconcile_single_element<I: Clone>(
        self,
        arena: &mut FiberArena<I>,
        parent: FiberId,
        current: Option<FiberId>,
        element: &Element,
    ) -> FiberId {
        if let Some(current) = current {
            let existing = &arena[current];
            let reusable = existing.key.as_ref() == element.key()
                && existing.tag != WorkTag::HostText
                && existing.element_type.as_ref() == Some(element.element_type());
            if reusable {
                let reused =
                    use_fiber(arena, current, Payload::Props(element.props().clone()));
                arena[reused].parent = Some(parent);
                return reused;
            }
            self.delete_child(arena, parent, current);
        }
        let mut fiber = Fiber::from_element(element);
        fiber.parent = Some(parent);
        arena.insert(fiber)
    }

    fn reconcile_single_text_node<I: Clone>(
        self,
        arena: &mut FiberArena<I>,
        parent: FiberId,
        current: Option<FiberId>,
        content: &Rc<str>,
    ) -> FiberId {
        if let Some(current) = current {
            if arena[current].tag == WorkTag::HostText {
                let reused = use_fiber(arena, current, Payload::Text(content.clone()));
                arena[reused].parent = Some(parent);
                return reused;
            }
            self.delete_child(arena, parent, current);
        }
        let mut fiber = Fiber::from_text(content.clone());
        fiber.parent = Some(parent);
        arena.insert(fiber)
    }

    fn place_single_child<I: Clone>(self, arena: &mut FiberArena<I>, fiber: FiberId) -> FiberId {
        if self.track_effects && arena[fiber].alternate.is_none() {
            arena[fiber].flags |= Flags::PLACEMENT;
        }
        fiber
    }

    fn delete_remaining<I: Clone>(
        self,
        arena: &mut FiberArena<I>,
        parent: FiberId,
        current: Option<FiberId>,
    ) {
        if let Some(current) = current {
            self.delete_child(arena, parent, current);
        }
    }

    fn delete_child<I: Clone>(self, arena: &mut FiberArena<I>, parent: FiberId, child: FiberId) {
        if !self.track_effects {
            return;
        }
        let parent = &mut arena[parent];
        parent.deletions.push(child);
        parent.flags |= Flags::CHILD_DELETION;
    }
}

/// Clones `fiber` into the work-in-progress generation with new props.
fn use_fiber<I: Clone>(arena: &mut FiberArena<I>, fiber: FiberId, pending: Payload) -> FiberId {
    let clone = arena.create_work_in_progress(fiber, pending);
    let node = &mut arena[clone];
    node.index = 0;
    node.sibling = None;
    clone
}
