#![doc = r"Fiber-based incremental reconciler for the Weave UI experiment."]
//!
//! A [`Root`] keeps two generations of fibers: the committed one and a
//! work-in-progress mirror linked pairwise through `alternate`. Each pass
//! diffs a [`Child`] description against the committed tree, records
//! [`Flags`] on the fibers that need host mutations, bubbles them up and
//! then commits them to a [`Host`] in one depth-first walk.

mod begin_work;
mod child_fiber;
pub mod collections;
mod commit_work;
mod complete_work;
pub mod element;
pub mod error;
mod fiber;
pub mod flags;
pub mod hooks;
pub mod host;
pub mod memory;
mod root;
mod tree;
pub mod update_queue;
mod work_loop;

pub use commit_work::{CommitSummary, Mutation, MutationKind};
pub use element::{
    is_valid_element, Child, Component, ComponentFn, Element, ElementRef, ElementType, Event,
    EventHandler, Key, PropValue, Props,
};
pub use error::{HookViolation, HostError, RenderError};
pub use fiber::{FiberId, WorkTag};
pub use flags::{Flags, MUTATION_MASK};
pub use hooks::{Dispatch, HookCx, HookMode};
pub use host::Host;
pub use memory::{HostNodeId, HostNodeKind, HostOp, MemoryHost};
pub use root::{create_root, create_root_with_options, Root, RootOptions};
pub use tree::FiberTree;
pub use update_queue::{process_update_queue, Action, Update, UpdateQueue};

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
