//! Synchronous render-and-commit driver.

use std::cell::RefCell;
use std::rc::Weak;

use crate::begin_work::begin_work;
use crate::collections::map::HashSet;
use crate::commit_work::{CommitContext, CommitSummary};
use crate::complete_work::complete_work;
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberArena, FiberId, WorkTag};
use crate::flags::MUTATION_MASK;
use crate::host::Host;
use crate::root::RootOptions;
use crate::tree::verify_subtree_flags;
use crate::update_queue::TakenUpdates;

/// Entry point hook dispatches use to re-run their root.
pub(crate) trait ScheduleUpdate {
    fn schedule_update_on_fiber(&self, fiber: FiberId) -> Result<(), RenderError>;
}

pub(crate) struct RootInner<H: Host> {
    pub(crate) host: H,
    pub(crate) container: H::Instance,
    pub(crate) fibers: FiberArena<H::Instance>,
    pub(crate) current: FiberId,
    work_in_progress: Option<FiberId>,
    finished_work: Option<FiberId>,
    taken_updates: TakenUpdates,
    pub(crate) options: RootOptions,
    pub(crate) last_commit: CommitSummary,
    handle: Weak<dyn ScheduleUpdate>,
}

impl<H: Host> RootInner<H> {
    pub(crate) fn new(
        host: H,
        container: H::Instance,
        options: RootOptions,
        handle: Weak<dyn ScheduleUpdate>,
    ) -> Self {
        let mut fibers = FiberArena::new();
        let current = fibers.insert(Fiber::host_root());
        Self {
            host,
            container,
            fibers,
            current,
            work_in_progress: None,
            finished_work: None,
            taken_updates: TakenUpdates::default(),
            options,
            last_commit: CommitSummary::default(),
            handle,
        }
    }

    /// Walks parent links from `fiber` and reports whether they end at a
    /// root fiber of this arena.
    fn mark_update_from_fiber_to_root(&self, fiber: FiberId) -> bool {
        let mut node = fiber;
        loop {
            let Some(current) = self.fibers.get(node) else {
                log::debug!(
                    "[{}] dropping update for released fiber {fiber:?}",
                    self.options.name
                );
                return false;
            };
            match current.parent {
                Some(parent) => node = parent,
                None if current.tag == WorkTag::Root => return true,
                None => {
                    log::warn!(
                        "[{}] fiber {fiber:?} is detached from the root; update ignored",
                        self.options.name
                    );
                    return false;
                }
            }
        }
    }

    /// Runs one complete pass. On failure the work-in-progress generation
    /// is discarded and the committed tree is left as it was.
    pub(crate) fn perform_sync_work_on_root(&mut self) -> Result<(), RenderError> {
        log::debug!(
            "[{}] render pass over {} fibers",
            self.options.name,
            self.fibers.len()
        );
        if let Err(err) = self.render_root_sync() {
            log::warn!("[{}] render pass aborted: {err}", self.options.name);
            self.discard_work_in_progress();
            return Err(err);
        }
        self.commit_root();
        Ok(())
    }

    fn render_root_sync(&mut self) -> Result<(), RenderError> {
        let root = self.prepare_fresh_stack();
        while let Some(unit) = self.work_in_progress {
            self.perform_unit_of_work(unit)?;
        }
        self.finished_work = Some(root);
        Ok(())
    }

    fn prepare_fresh_stack(&mut self) -> FiberId {
        self.finished_work = None;
        self.taken_updates.clear();
        let pending = self.fibers[self.current].pending.clone();
        let root = self.fibers.create_work_in_progress(self.current, pending);
        self.work_in_progress = Some(root);
        root
    }

    fn perform_unit_of_work(&mut self, unit: FiberId) -> Result<(), RenderError> {
        let next = begin_work(&mut self.fibers, &self.handle, &mut self.taken_updates, unit)?;
        let fiber = &mut self.fibers[unit];
        fiber.memoized = Some(fiber.pending.clone());
        match next {
            Some(child) => {
                self.work_in_progress = Some(child);
                Ok(())
            }
            None => self.complete_unit_of_work(unit),
        }
    }

    fn complete_unit_of_work(&mut self, unit: FiberId) -> Result<(), RenderError> {
        let mut node = unit;
        loop {
            complete_work(&mut self.fibers, &mut self.host, node)?;
            if let Some(sibling) = self.fibers[node].sibling {
                self.work_in_progress = Some(sibling);
                return Ok(());
            }
            match self.fibers[node].parent {
                Some(parent) => node = parent,
                None => {
                    self.work_in_progress = None;
                    return Ok(());
                }
            }
        }
    }

    fn commit_root(&mut self) {
        let Some(finished) = self.finished_work.take() else {
            return;
        };
        if self.options.verify_flags {
            if let Err(violation) = verify_subtree_flags(&self.fibers, finished) {
                panic!("[{}] {violation}", self.options.name);
            }
        }

        let root = &self.fibers[finished];
        let summary = if (root.flags | root.subtree_flags).intersects(MUTATION_MASK) {
            let mut commit = CommitContext {
                arena: &mut self.fibers,
                host: &mut self.host,
                container: &self.container,
                summary: CommitSummary::default(),
            };
            commit.commit_mutation_effects(finished);
            commit.summary
        } else {
            CommitSummary::default()
        };

        self.current = finished;
        self.taken_updates.clear();
        log::debug!(
            "[{}] committed {} mutations",
            self.options.name,
            summary.len()
        );
        self.last_commit = summary;
    }

    /// Drops every fiber the committed tree cannot reach, hands consumed
    /// updates back to their queues and lets the host reclaim instances
    /// that were built but never inserted.
    fn discard_work_in_progress(&mut self) {
        self.work_in_progress = None;
        self.finished_work = None;

        let restored = self.taken_updates.restore();
        if restored > 0 {
            log::debug!(
                "[{}] returned {restored} pending updates to their queues",
                self.options.name
            );
        }

        let mut reachable = HashSet::new();
        for fiber in self.fibers.subtree(self.current) {
            reachable.insert(fiber);
            if let Some(alternate) = self.fibers[fiber].alternate {
                reachable.insert(alternate);
            }
        }
        let before = self.fibers.len();
        let mut orphaned = Vec::new();
        self.fibers.retain(|id, fiber| {
            let keep = reachable.contains(&id);
            if !keep {
                orphaned.extend(fiber.state_node.take());
            }
            keep
        });
        for instance in &orphaned {
            self.host.discard_instance(instance);
        }
        log::debug!(
            "[{}] released {} fibers and {} host instances from the aborted pass",
            self.options.name,
            before - self.fibers.len(),
            orphaned.len()
        );
    }
}

impl<H: Host + 'static> ScheduleUpdate for RefCell<RootInner<H>> {
    fn schedule_update_on_fiber(&self, fiber: FiberId) -> Result<(), RenderError> {
        let Ok(mut inner) = self.try_borrow_mut() else {
            log::warn!("update on {fiber:?} dispatched during a render pass; it stays queued");
            return Err(RenderError::RenderInProgress);
        };
        if !inner.mark_update_from_fiber_to_root(fiber) {
            return Ok(());
        }
        inner.perform_sync_work_on_root()
    }
}
