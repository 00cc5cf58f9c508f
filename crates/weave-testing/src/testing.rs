use weave_core::{
    create_root_with_options, Child, CommitSummary, Event, FiberTree, HostNodeId, HostOp,
    MemoryHost, RenderError, Root, RootOptions,
};

/// Headless harness for exercising a root in tests.
///
/// `RootTestRule` owns an in-memory host and a container node mounted into a
/// [`Root`]. Flag verification is always on, so every pass also checks the
/// subtree-flag invariant.
pub struct RootTestRule {
    root: Root<MemoryHost>,
    container: HostNodeId,
    content: Option<Child>,
}

impl RootTestRule {
    pub fn new() -> Self {
        Self::with_options(RootOptions::new().with_name("test-rule"))
    }

    pub fn with_options(options: RootOptions) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let root = create_root_with_options(host, container, options.with_verify_flags(true));
        Self {
            root,
            container,
            content: None,
        }
    }

    /// Install `content` and render it.
    pub fn set_content(&mut self, content: impl Into<Child>) -> Result<(), RenderError> {
        let content = content.into();
        log::debug!("installing test content {content:?}");
        self.content = Some(content.clone());
        self.root.render(content)
    }

    /// Render the installed content again.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        match self.content.clone() {
            Some(content) => self.root.render(content),
            None => Ok(()),
        }
    }

    pub fn unmount(&mut self) -> Result<(), RenderError> {
        self.content = None;
        self.root.unmount()
    }

    pub fn root(&self) -> &Root<MemoryHost> {
        &self.root
    }

    pub fn container(&self) -> HostNodeId {
        self.container
    }

    pub fn markup(&self) -> String {
        self.root.with_host(|host| host.to_markup(self.container))
    }

    pub fn text_content(&self) -> String {
        self.root.with_host(|host| host.text_content(self.container))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<HostNodeId> {
        self.root
            .with_host(|host| host.find_by_tag(self.container, tag))
    }

    /// First element with `tag`; panics when there is none.
    pub fn node_by_tag(&self, tag: &str) -> HostNodeId {
        match self.find_by_tag(tag).first() {
            Some(&node) => node,
            None => panic!("no <{tag}> in {}", self.markup()),
        }
    }

    /// Whether `node` is still attached under the container.
    pub fn is_attached(&self, node: HostNodeId) -> bool {
        self.root
            .with_host(|host| host.contains(self.container, node))
    }

    /// Deliver an `onClick` event to `node`.
    pub fn click(&self, node: HostNodeId) -> Result<bool, RenderError> {
        self.fire(node, &Event::new("onClick"))
    }

    pub fn fire(&self, node: HostNodeId, event: &Event) -> Result<bool, RenderError> {
        self.root.dispatch_event(&node, event)
    }

    pub fn last_commit(&self) -> CommitSummary {
        self.root.last_commit()
    }

    /// Drain the host operations recorded since the previous call.
    pub fn take_host_ops(&self) -> Vec<HostOp> {
        self.root.with_host_mut(MemoryHost::take_ops)
    }

    pub fn host<R>(&self, f: impl FnOnce(&MemoryHost) -> R) -> R {
        self.root.with_host(f)
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&FiberTree<'_, HostNodeId>) -> R) -> R {
        self.root.inspect(f)
    }
}

impl Default for RootTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RootTestRule`.
pub fn run_test_root<R>(f: impl FnOnce(&mut RootTestRule) -> R) -> R {
    let mut rule = RootTestRule::new();
    f(&mut rule)
}
