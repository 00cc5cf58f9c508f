//! Mount points and the upward entry points into the engine.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::commit_work::CommitSummary;
use crate::element::{Child, Event, EventHandler};
use crate::error::RenderError;
use crate::fiber::WorkTag;
use crate::host::Host;
use crate::tree::FiberTree;
use crate::update_queue::{Action, Update};
use crate::work_loop::{RootInner, ScheduleUpdate};

/// Per-root settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootOptions {
    /// Prefix for this root's log lines.
    pub name: Cow<'static, str>,
    /// Re-check the flag-bubbling invariant before every commit and panic on
    /// a mismatch.
    pub verify_flags: bool,
}

impl RootOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_verify_flags(mut self, verify_flags: bool) -> Self {
        self.verify_flags = verify_flags;
        self
    }
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("root"),
            verify_flags: cfg!(debug_assertions),
        }
    }
}

/// Handle to one mount point.
///
/// All passes run synchronously on the calling thread; the handle is neither
/// `Send` nor `Sync`.
pub struct Root<H: Host + 'static> {
    inner: Rc<RefCell<RootInner<H>>>,
}

pub fn create_root<H: Host + 'static>(host: H, container: H::Instance) -> Root<H> {
    create_root_with_options(host, container, RootOptions::default())
}

pub fn create_root_with_options<H: Host + 'static>(
    host: H,
    container: H::Instance,
    options: RootOptions,
) -> Root<H> {
    let inner = Rc::new_cyclic(|weak: &Weak<RefCell<RootInner<H>>>| {
        let handle: Weak<dyn ScheduleUpdate> = weak.clone();
        RefCell::new(RootInner::new(host, container, options, handle))
    });
    Root { inner }
}

impl<H: Host + 'static> Root<H> {
    /// Replaces the rendered description and runs a pass before returning.
    pub fn render(&self, child: impl Into<Child>) -> Result<(), RenderError> {
        let mut inner = self
            .inner
            .try_borrow_mut()
            .map_err(|_| RenderError::RenderInProgress)?;
        let current = inner.current;
        if let Some(queue) = inner.fibers[current].update_queue.as_ref() {
            queue
                .borrow_mut()
                .enqueue(Update::new(Action::Replace(child.into())));
        }
        inner.perform_sync_work_on_root()
    }

    /// Removes everything this root has mounted.
    pub fn unmount(&self) -> Result<(), RenderError> {
        self.render(Child::Empty)
    }

    /// Delivers `event` to the handler registered under `event.name` on the
    /// host component owning `target`, or on its nearest host ancestor that
    /// has one. Returns whether a handler ran.
    pub fn dispatch_event(&self, target: &H::Instance, event: &Event) -> Result<bool, RenderError> {
        let Some(handler) = self.find_handler(target, &event.name)? else {
            log::trace!("no `{}` handler for {target:?}", event.name);
            return Ok(false);
        };
        handler(event)?;
        Ok(true)
    }

    fn find_handler(
        &self,
        target: &H::Instance,
        event: &str,
    ) -> Result<Option<EventHandler>, RenderError> {
        let inner = self
            .inner
            .try_borrow()
            .map_err(|_| RenderError::RenderInProgress)?;
        let fibers = &inner.fibers;
        let Some(mut node) = fibers.subtree(inner.current).into_iter().find(|&id| {
            let fiber = &fibers[id];
            fiber.tag == WorkTag::HostComponent && fiber.state_node.as_ref() == Some(target)
        }) else {
            return Ok(None);
        };

        loop {
            let fiber = &fibers[node];
            if fiber.tag == WorkTag::HostComponent {
                let handler = fiber
                    .memoized
                    .as_ref()
                    .and_then(|memo| memo.props())
                    .and_then(|props| props.handler(event));
                if let Some(handler) = handler {
                    return Ok(Some(handler.clone()));
                }
            }
            match fiber.parent {
                Some(parent) => node = parent,
                None => return Ok(None),
            }
        }
    }

    /// Mutations applied by the most recent pass.
    pub fn last_commit(&self) -> CommitSummary {
        self.inner.borrow().last_commit.clone()
    }

    /// Runs `f` over a read-only view of the committed generation.
    pub fn inspect<R>(&self, f: impl FnOnce(&FiberTree<'_, H::Instance>) -> R) -> R {
        let inner = self.inner.borrow();
        f(&FiberTree::new(&inner.fibers, inner.current))
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.inner.borrow().host)
    }

    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.inner.borrow_mut().host)
    }

    pub fn container(&self) -> H::Instance {
        self.inner.borrow().container.clone()
    }

    pub fn options(&self) -> RootOptions {
        self.inner.borrow().options.clone()
    }

    /// Number of fibers alive across both generations.
    pub fn fiber_count(&self) -> usize {
        self.inner.borrow().fibers.len()
    }
}

impl<H: Host + 'static> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Root")
                .field("name", &inner.options.name)
                .field("current", &inner.current)
                .field("fibers", &inner.fibers.len())
                .finish(),
            Err(_) => f.write_str("Root { <rendering> }"),
        }
    }
}
