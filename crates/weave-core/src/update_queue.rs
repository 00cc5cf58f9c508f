//! Single-slot update queue shared by the root fiber and state hooks.
//!
//! A queue holds at most one pending [`Update`]. Enqueueing overwrites
//! whatever is pending, so only the latest dispatch before a render survives.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::hooks::Dispatch;

/// A state transition: either a replacement value or a pure reducer.
pub enum Action<S> {
    Replace(S),
    Reduce(Box<dyn Fn(&S) -> S>),
}

impl<S: Clone> Action<S> {
    /// Applies the reduction rule to `state`. The action itself is kept so
    /// an aborted pass can hand it back to its queue.
    pub fn apply(&self, state: &S) -> S {
        match self {
            Action::Replace(value) => value.clone(),
            Action::Reduce(reduce) => reduce(state),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Action::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

/// An enqueued [`Action`].
pub struct Update<S> {
    action: Action<S>,
}

impl<S> Update<S> {
    pub fn new(action: Action<S>) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &Action<S> {
        &self.action
    }
}

impl<S: fmt::Debug> fmt::Debug for Update<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update").field("action", &self.action).finish()
    }
}

pub struct UpdateQueue<S> {
    pending: Option<Update<S>>,
    dispatch: Option<Dispatch<S>>,
}

impl<S> UpdateQueue<S> {
    pub fn new() -> Self {
        Self {
            pending: None,
            dispatch: None,
        }
    }

    pub(crate) fn with_dispatch(dispatch: Dispatch<S>) -> Self {
        Self {
            pending: None,
            dispatch: Some(dispatch),
        }
    }

    /// Stores `update` as the pending update, dropping any earlier one.
    pub fn enqueue(&mut self, update: Update<S>) {
        if self.pending.is_some() {
            log::trace!("pending update overwritten before flush");
        }
        self.pending = Some(update);
    }

    pub fn take_pending(&mut self) -> Option<Update<S>> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn dispatch(&self) -> Option<&Dispatch<S>> {
        self.dispatch.as_ref()
    }
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("has_pending", &self.pending.is_some())
            .field("bound", &self.dispatch.is_some())
            .finish()
    }
}

/// Folds the pending update (if any) into `base_state`.
pub fn process_update_queue<S: Clone>(base_state: S, pending: Option<&Update<S>>) -> S {
    match pending {
        Some(update) => update.action.apply(&base_state),
        None => base_state,
    }
}

/// Takes the pending update off `queue`, folds it into `base_state` and
/// parks it in `taken` until the pass commits or aborts.
pub(crate) fn drain_pending<S: Clone + 'static>(
    queue: &Rc<RefCell<UpdateQueue<S>>>,
    base_state: S,
    taken: &mut TakenUpdates,
) -> S {
    let pending = queue.borrow_mut().take_pending();
    let state = process_update_queue(base_state, pending.as_ref());
    if let Some(update) = pending {
        taken.record(queue, update);
    }
    state
}

/// Updates folded into the work-in-progress generation of one pass.
///
/// Queues are shared by both generations, so a pass that aborts must give
/// back what it took. Committing drops the entries.
#[derive(Default)]
pub(crate) struct TakenUpdates {
    entries: Vec<Box<dyn Restore>>,
}

trait Restore {
    /// Puts the update back unless a newer one already holds the slot.
    fn restore(self: Box<Self>) -> bool;
}

struct Taken<S> {
    queue: Rc<RefCell<UpdateQueue<S>>>,
    update: Update<S>,
}

impl<S> Restore for Taken<S> {
    fn restore(self: Box<Self>) -> bool {
        let Taken { queue, update } = *self;
        let mut slot = queue.borrow_mut();
        if slot.has_pending() {
            return false;
        }
        slot.pending = Some(update);
        true
    }
}

impl TakenUpdates {
    fn record<S: 'static>(&mut self, queue: &Rc<RefCell<UpdateQueue<S>>>, update: Update<S>) {
        self.entries.push(Box::new(Taken {
            queue: queue.clone(),
            update,
        }));
    }

    pub(crate) fn append(&mut self, other: &mut TakenUpdates) {
        self.entries.append(&mut other.entries);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns every entry to its queue and reports how many went back.
    pub(crate) fn restore(&mut self) -> usize {
        self.entries
            .drain(..)
            .rev()
            .map(|entry| entry.restore())
            .filter(|&restored| restored)
            .count()
    }
}
