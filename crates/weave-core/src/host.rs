//! Capability set the reconciler needs from a host environment.

use std::fmt;

use crate::element::Props;
use crate::error::HostError;

/// A host environment the reconciler can drive.
///
/// Containers are ordinary instances: the root container passed to
/// [`create_root`](crate::create_root) receives top-level children through
/// [`append_child_to_container`](Host::append_child_to_container).
pub trait Host {
    type Instance: Clone + PartialEq + fmt::Debug + 'static;

    fn create_instance(&mut self, tag: &str, props: &Props) -> Result<Self::Instance, HostError>;

    fn create_text_instance(&mut self, text: &str) -> Result<Self::Instance, HostError>;

    /// Attaches `child` to a freshly created, not yet inserted `parent`.
    fn append_initial_child(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
    ) -> Result<(), HostError>;

    fn append_child_to_container(
        &mut self,
        container: &Self::Instance,
        child: &Self::Instance,
    ) -> Result<(), HostError>;

    /// Detaches `child` (and implicitly its descendants) from `container`.
    fn remove_child(
        &mut self,
        child: &Self::Instance,
        container: &Self::Instance,
    ) -> Result<(), HostError>;

    fn commit_instance_update(
        &mut self,
        instance: &Self::Instance,
        props: &Props,
    ) -> Result<(), HostError>;

    fn commit_text_update(&mut self, instance: &Self::Instance, text: &str)
        -> Result<(), HostError>;

    /// Called for instances created by a pass that was then aborted. They
    /// were never inserted into a container. Hosts with nothing to reclaim
    /// keep the default.
    fn discard_instance(&mut self, _instance: &Self::Instance) {}
}
