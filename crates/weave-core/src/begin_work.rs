//! Top-down half of a render pass.

use std::rc::Weak;

use crate::child_fiber::{MOUNT_CHILD_FIBERS, RECONCILE_CHILD_FIBERS};
use crate::element::Child;
use crate::error::RenderError;
use crate::fiber::{FiberArena, FiberId, FiberState, WorkTag};
use crate::hooks::render_with_hooks;
use crate::update_queue::{drain_pending, TakenUpdates};
use crate::work_loop::ScheduleUpdate;

/// Computes the children of `wip` and returns the first one to visit.
pub(crate) fn begin_work<I: Clone>(
    arena: &mut FiberArena<I>,
    scheduler: &Weak<dyn ScheduleUpdate>,
    taken: &mut TakenUpdates,
    wip: FiberId,
) -> Result<Option<FiberId>, RenderError> {
    log::trace!("begin {:?} ({:?})", wip, arena[wip].tag);
    match arena[wip].tag {
        WorkTag::Root => Ok(update_host_root(arena, taken, wip)),
        WorkTag::HostComponent => {
            let children = arena[wip]
                .pending
                .props()
                .map(|props| props.children().clone())
                .unwrap_or_default();
            Ok(reconcile_children(arena, wip, &children))
        }
        WorkTag::FunctionComponent => {
            let children = render_with_hooks(arena, wip, scheduler, taken)?;
            Ok(reconcile_children(arena, wip, &children))
        }
        WorkTag::HostText => Ok(None),
    }
}

fn update_host_root<I: Clone>(
    arena: &mut FiberArena<I>,
    taken: &mut TakenUpdates,
    wip: FiberId,
) -> Option<FiberId> {
    let fiber = &arena[wip];
    let base = match &fiber.state {
        FiberState::Root(child) => child.clone(),
        _ => Child::Empty,
    };
    let next = match &fiber.update_queue {
        Some(queue) => drain_pending(queue, base, taken),
        None => base,
    };
    arena[wip].state = FiberState::Root(next.clone());
    reconcile_children(arena, wip, &next)
}

fn reconcile_children<I: Clone>(
    arena: &mut FiberArena<I>,
    wip: FiberId,
    children: &Child,
) -> Option<FiberId> {
    let child = match arena[wip].alternate {
        Some(current) => {
            let current_child = arena[current].child;
            RECONCILE_CHILD_FIBERS.reconcile(arena, wip, current_child, children)
        }
        None => MOUNT_CHILD_FIBERS.reconcile(arena, wip, None, children),
    };
    arena[wip].child = child;
    child
}
