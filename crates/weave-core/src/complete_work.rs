//! Bottom-up half of a render pass: host instances and flag bubbling.

use crate::error::RenderError;
use crate::fiber::{FiberArena, FiberId, WorkTag};
use crate::flags::Flags;
use crate::host::Host;

pub(crate) fn complete_work<H: Host>(
    arena: &mut FiberArena<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<(), RenderError> {
    log::trace!("complete {:?} ({:?})", wip, arena[wip].tag);
    match arena[wip].tag {
        WorkTag::HostComponent => complete_host_component(arena, host, wip)?,
        WorkTag::HostText => complete_host_text(arena, host, wip)?,
        WorkTag::Root | WorkTag::FunctionComponent => {}
    }
    bubble_properties(arena, wip);
    Ok(())
}

fn complete_host_component<H: Host>(
    arena: &mut FiberArena<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<(), RenderError> {
    let fiber = &arena[wip];
    let Some(props) = fiber.pending.props().cloned() else {
        log::warn!("host component {wip:?} has no props; skipping");
        return Ok(());
    };

    let updating = fiber.alternate.filter(|_| fiber.state_node.is_some());
    if let Some(current) = updating {
        // Applied in commit; here we only decide.
        let changed = match arena[current].memoized.as_ref().and_then(|memo| memo.props()) {
            Some(previous) => previous.attributes_differ(&props),
            None => true,
        };
        if changed {
            arena[wip].flags |= Flags::UPDATE;
        }
        return Ok(());
    }

    let Some(tag) = fiber
        .element_type
        .as_ref()
        .and_then(|element_type| element_type.host_tag())
        .map(str::to_owned)
    else {
        log::warn!("host component {wip:?} has no tag; skipping");
        return Ok(());
    };
    let instance = host.create_instance(&tag, &props)?;
    append_all_children(arena, host, wip, &instance)?;
    arena[wip].state_node = Some(instance);
    Ok(())
}

fn complete_host_text<H: Host>(
    arena: &mut FiberArena<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<(), RenderError> {
    let fiber = &arena[wip];
    let text = fiber.pending.text().unwrap_or_default().to_owned();

    let updating = fiber.alternate.filter(|_| fiber.state_node.is_some());
    if let Some(current) = updating {
        let previous = arena[current].memoized.as_ref().and_then(|memo| memo.text());
        if previous != Some(text.as_str()) {
            arena[wip].flags |= Flags::UPDATE;
        }
        return Ok(());
    }

    let instance = host.create_text_instance(&text)?;
    arena[wip].state_node = Some(instance);
    Ok(())
}

/// Attaches the nearest host instances below `wip` to `instance`, looking
/// through function components which own none.
fn append_all_children<H: Host>(
    arena: &FiberArena<H::Instance>,
    host: &mut H,
    wip: FiberId,
    instance: &H::Instance,
) -> Result<(), RenderError> {
    let Some(mut node) = arena[wip].child else {
        return Ok(());
    };
    loop {
        let fiber = &arena[node];
        if fiber.tag.is_host() {
            if let Some(child) = fiber.state_node.as_ref() {
                host.append_initial_child(instance, child)?;
            }
        } else if let Some(child) = fiber.child {
            node = child;
            continue;
        }

        loop {
            if let Some(sibling) = arena[node].sibling {
                node = sibling;
                break;
            }
            match arena[node].parent {
                Some(parent) if parent != wip => node = parent,
                _ => return Ok(()),
            }
        }
    }
}

/// Folds every child's own and subtree flags into `wip.subtree_flags` and
/// re-points the children at `wip`.
fn bubble_properties<I: Clone>(arena: &mut FiberArena<I>, wip: FiberId) {
    let mut subtree_flags = Flags::empty();
    let mut next = arena[wip].child;
    while let Some(id) = next {
        let child = &mut arena[id];
        subtree_flags |= child.flags | child.subtree_flags;
        child.parent = Some(wip);
        next = child.sibling;
    }
    arena[wip].subtree_flags |= subtree_flags;
}
