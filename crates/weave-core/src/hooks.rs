//! Positional state for function components.
//!
//! A component's hooks form an ordered list stored on its fiber. The Nth
//! hook call in one render must correspond to the Nth call in the previous
//! render of the same fiber; breaking that contract panics with a
//! [`HookViolation`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::element::{Child, ElementType, Props};
use crate::error::{HookViolation, RenderError};
use crate::fiber::{FiberArena, FiberId, FiberState};
use crate::update_queue::{drain_pending, Action, TakenUpdates, Update, UpdateQueue};
use crate::work_loop::ScheduleUpdate;

/// One slot in a component's hook list.
#[derive(Clone)]
pub(crate) struct Hook {
    memoized_state: Rc<dyn Any>,
    queue: Option<Rc<dyn Any>>,
}

type SharedQueue<T> = Rc<RefCell<UpdateQueue<T>>>;

/// Which hook implementation serves this render; chosen once per render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookMode {
    FirstRender,
    SubsequentRender,
}

/// Render context handed to a function component.
///
/// Carries the fiber being rendered and the hook cursor. Only the engine can
/// create one, so hooks cannot run outside an active render.
pub struct HookCx {
    fiber: FiberId,
    component: &'static str,
    mode: HookMode,
    previous: Vec<Hook>,
    hooks: Vec<Hook>,
    taken: TakenUpdates,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl HookCx {
    fn new(
        fiber: FiberId,
        component: &'static str,
        mode: HookMode,
        previous: Vec<Hook>,
        scheduler: Weak<dyn ScheduleUpdate>,
    ) -> Self {
        Self {
            fiber,
            component,
            mode,
            previous,
            hooks: Vec::new(),
            taken: TakenUpdates::default(),
            scheduler,
        }
    }

    pub fn mode(&self) -> HookMode {
        self.mode
    }

    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Number of hooks called so far in this render.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Declares a state slot initialised to `initial` on first render.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Dispatch<T>) {
        self.use_state_with(move || initial)
    }

    /// Declares a state slot whose initial value comes from `init`, which
    /// runs exactly once, on the first render.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, Dispatch<T>) {
        match self.mode {
            HookMode::FirstRender => self.mount_state(init),
            HookMode::SubsequentRender => self.update_state(),
        }
    }

    fn mount_state<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, Dispatch<T>) {
        let state = init();
        let fiber = self.fiber;
        let scheduler = self.scheduler.clone();
        let queue: SharedQueue<T> = Rc::new_cyclic(|queue| {
            RefCell::new(UpdateQueue::with_dispatch(Dispatch {
                fiber,
                queue: queue.clone(),
                scheduler,
            }))
        });
        let dispatch = self.bound_dispatch(&queue);
        self.hooks.push(Hook {
            memoized_state: Rc::new(state.clone()),
            queue: Some(queue),
        });
        (state, dispatch)
    }

    fn update_state<T: Clone + 'static>(&mut self) -> (T, Dispatch<T>) {
        let index = self.hooks.len();
        let Some(previous) = self.previous.get(index) else {
            panic!(
                "{}",
                HookViolation::ExtraHook {
                    component: self.component,
                    index,
                }
            );
        };
        let mismatch = || HookViolation::SlotMismatch {
            component: self.component,
            index,
        };
        let Some(old_state) = previous.memoized_state.downcast_ref::<T>().cloned() else {
            panic!("{}", mismatch());
        };
        let Some(queue) = previous
            .queue
            .clone()
            .and_then(|queue| queue.downcast::<RefCell<UpdateQueue<T>>>().ok())
        else {
            panic!("{}", mismatch());
        };

        let state = drain_pending(&queue, old_state, &mut self.taken);
        let dispatch = self.bound_dispatch(&queue);
        self.hooks.push(Hook {
            memoized_state: Rc::new(state.clone()),
            queue: Some(queue),
        });
        (state, dispatch)
    }

    fn bound_dispatch<T: 'static>(&self, queue: &SharedQueue<T>) -> Dispatch<T> {
        match queue.borrow().dispatch() {
            Some(dispatch) => dispatch.clone(),
            None => panic!(
                "{}",
                HookViolation::SlotMismatch {
                    component: self.component,
                    index: self.hooks.len(),
                }
            ),
        }
    }

    fn finish(self) -> Vec<Hook> {
        if self.mode == HookMode::SubsequentRender && self.hooks.len() != self.previous.len() {
            panic!(
                "{}",
                HookViolation::MissingHooks {
                    component: self.component,
                    expected: self.previous.len(),
                    actual: self.hooks.len(),
                }
            );
        }
        self.hooks
    }
}

impl fmt::Debug for HookCx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCx")
            .field("fiber", &self.fiber)
            .field("component", &self.component)
            .field("mode", &self.mode)
            .field("cursor", &self.hooks.len())
            .finish()
    }
}

/// Handle that enqueues state transitions for one hook slot and re-runs the
/// owning root synchronously.
pub struct Dispatch<T> {
    fiber: FiberId,
    queue: Weak<RefCell<UpdateQueue<T>>>,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl<T: 'static> Dispatch<T> {
    /// Enqueues `action`, replacing any update that has not been rendered
    /// yet, and runs a render pass before returning.
    ///
    /// Dispatching to a component that has been unmounted is a no-op.
    pub fn dispatch(&self, action: Action<T>) -> Result<(), RenderError> {
        let Some(queue) = self.queue.upgrade() else {
            log::debug!("dropping update for unmounted state hook on {:?}", self.fiber);
            return Ok(());
        };
        queue.borrow_mut().enqueue(Update::new(action));
        let Some(scheduler) = self.scheduler.upgrade() else {
            log::debug!("dropping update for {:?}: root was dropped", self.fiber);
            return Ok(());
        };
        scheduler.schedule_update_on_fiber(self.fiber)
    }

    pub fn set(&self, value: T) -> Result<(), RenderError> {
        self.dispatch(Action::Replace(value))
    }

    pub fn update(&self, reduce: impl Fn(&T) -> T + 'static) -> Result<(), RenderError> {
        self.dispatch(Action::Reduce(Box::new(reduce)))
    }
}

impl<T> Clone for Dispatch<T> {
    fn clone(&self) -> Self {
        Self {
            fiber: self.fiber,
            queue: self.queue.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T> PartialEq for Dispatch<T> {
    fn eq(&self, other: &Self) -> bool {
        self.queue.ptr_eq(&other.queue)
    }
}

impl<T> fmt::Debug for Dispatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("fiber", &self.fiber)
            .field("live", &(self.queue.strong_count() > 0))
            .finish()
    }
}

/// Runs the component bound to `wip` and stores its new hook list. Updates
/// the hooks consume are moved into `taken`, whether or not the render
/// succeeds.
pub(crate) fn render_with_hooks<I: Clone>(
    arena: &mut FiberArena<I>,
    wip: FiberId,
    scheduler: &Weak<dyn ScheduleUpdate>,
    taken: &mut TakenUpdates,
) -> Result<Child, RenderError> {
    let fiber = &arena[wip];
    let Some(component) = fiber.element_type.as_ref().and_then(ElementType::component) else {
        log::warn!("function fiber {wip:?} has no component type; rendering nothing");
        return Ok(Child::Empty);
    };
    let (mode, previous) = match fiber.alternate {
        Some(current) => (HookMode::SubsequentRender, arena[current].hooks().to_vec()),
        None => (HookMode::FirstRender, Vec::new()),
    };
    let props: Props = fiber.pending.props().cloned().unwrap_or_default();

    let mut cx = HookCx::new(wip, component.name(), mode, previous, scheduler.clone());
    let render = component.render_fn();
    let rendered = render(&mut cx, &props);
    taken.append(&mut cx.taken);
    let children = rendered.map_err(|source| RenderError::Component {
        component: component.name(),
        source,
    })?;
    arena[wip].state = FiberState::Hooks(cx.finish());
    Ok(children)
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
