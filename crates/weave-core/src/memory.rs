//! In-memory host used by tests, benches and headless embedding.

use std::fmt;

use crate::collections::map::HashMap;
use crate::element::{PropValue, Props};
use crate::error::HostError;
use crate::host::Host;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(usize);

impl HostNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostNodeKind {
    Container,
    Element {
        tag: String,
        attributes: HashMap<String, PropValue>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
struct HostNode {
    kind: HostNodeKind,
    parent: Option<HostNodeId>,
    children: Vec<HostNodeId>,
}

/// Host call as recorded by [`MemoryHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    CreateInstance { id: HostNodeId, tag: String },
    CreateText { id: HostNodeId, text: String },
    AppendInitialChild { parent: HostNodeId, child: HostNodeId },
    AppendToContainer { container: HostNodeId, child: HostNodeId },
    RemoveChild { container: HostNodeId, child: HostNodeId },
    UpdateInstance { id: HostNodeId },
    UpdateText { id: HostNodeId, text: String },
    Discard { id: HostNodeId },
}

#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<HostNode>>,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached node to mount a root into.
    pub fn create_container(&mut self) -> HostNodeId {
        self.allocate(HostNodeKind::Container)
    }

    fn allocate(&mut self, kind: HostNodeKind) -> HostNodeId {
        let id = HostNodeId(self.nodes.len());
        self.nodes.push(Some(HostNode {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, id: HostNodeId) -> Result<&HostNode, HostError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| HostError::Missing {
                instance: id.to_string(),
            })
    }

    fn node_mut(&mut self, id: HostNodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| HostError::Missing {
                instance: id.to_string(),
            })
    }

    /// Moves `child` under `parent`, detaching it from any previous parent.
    fn attach(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
        if matches!(self.node(parent)?.kind, HostNodeKind::Text(_)) {
            return Err(HostError::Rejected {
                reason: format!("text node {parent} cannot have children"),
            });
        }
        if let Some(previous) = self.node(child)?.parent {
            self.node_mut(previous)?.children.retain(|&id| id != child);
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Frees `id` and everything below it.
    fn release(&mut self, id: HostNodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    pub fn is_live(&self, id: HostNodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self, id: HostNodeId) -> Option<&HostNodeKind> {
        self.node(id).ok().map(|node| &node.kind)
    }

    pub fn parent(&self, id: HostNodeId) -> Option<HostNodeId> {
        self.node(id).ok()?.parent
    }

    pub fn children(&self, id: HostNodeId) -> &[HostNodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn tag(&self, id: HostNodeId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: HostNodeId, name: &str) -> Option<&PropValue> {
        match self.kind(id)? {
            HostNodeKind::Element { attributes, .. } => attributes.get(name),
            _ => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: HostNodeId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: HostNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: HostNodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Whether `node` is `ancestor` or attached somewhere below it.
    pub fn contains(&self, ancestor: HostNodeId, node: HostNodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if !self.is_live(id) {
                return false;
            }
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Live element nodes under `root` with the given tag, in tree order.
    pub fn find_by_tag(&self, root: HostNodeId, tag: &str) -> Vec<HostNodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Serializes the children of `id` (or `id` itself for non-containers)
    /// as markup with attributes in name order.
    pub fn to_markup(&self, id: HostNodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: HostNodeId, out: &mut String) {
        match self.kind(id) {
            Some(HostNodeKind::Container) => {
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
            }
            Some(HostNodeKind::Text(text)) => out.push_str(text),
            Some(HostNodeKind::Element { tag, attributes }) => {
                out.push('<');
                out.push_str(tag);
                let mut names: Vec<&String> = attributes.keys().collect();
                names.sort();
                for name in names {
                    out.push_str(&format!(" {name}=\"{}\"", attributes[name]));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            None => out.push_str(&format!("<!-- missing {id} -->")),
        }
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }
}

fn attribute_map(props: &Props) -> HashMap<String, PropValue> {
    props
        .attributes()
        .map(|(name, value)| (name.to_owned(), value.clone()))
        .collect()
}

impl Host for MemoryHost {
    type Instance = HostNodeId;

    fn create_instance(&mut self, tag: &str, props: &Props) -> Result<HostNodeId, HostError> {
        let id = self.allocate(HostNodeKind::Element {
            tag: tag.to_owned(),
            attributes: attribute_map(props),
        });
        self.ops.push(HostOp::CreateInstance {
            id,
            tag: tag.to_owned(),
        });
        Ok(id)
    }

    fn create_text_instance(&mut self, text: &str) -> Result<HostNodeId, HostError> {
        let id = self.allocate(HostNodeKind::Text(text.to_owned()));
        self.ops.push(HostOp::CreateText {
            id,
            text: text.to_owned(),
        });
        Ok(id)
    }

    fn append_initial_child(
        &mut self,
        parent: &HostNodeId,
        child: &HostNodeId,
    ) -> Result<(), HostError> {
        self.attach(*parent, *child)?;
        self.ops.push(HostOp::AppendInitialChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn append_child_to_container(
        &mut self,
        container: &HostNodeId,
        child: &HostNodeId,
    ) -> Result<(), HostError> {
        self.attach(*container, *child)?;
        self.ops.push(HostOp::AppendToContainer {
            container: *container,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(
        &mut self,
        child: &HostNodeId,
        container: &HostNodeId,
    ) -> Result<(), HostError> {
        if self.node(*child)?.parent != Some(*container) {
            return Err(HostError::NotAttached {
                child: child.to_string(),
                parent: container.to_string(),
            });
        }
        self.node_mut(*container)?
            .children
            .retain(|&id| id != *child);
        self.release(*child);
        self.ops.push(HostOp::RemoveChild {
            container: *container,
            child: *child,
        });
        Ok(())
    }

    fn commit_instance_update(
        &mut self,
        instance: &HostNodeId,
        props: &Props,
    ) -> Result<(), HostError> {
        match &mut self.node_mut(*instance)?.kind {
            HostNodeKind::Element { attributes, .. } => *attributes = attribute_map(props),
            _ => {
                return Err(HostError::Rejected {
                    reason: format!("{instance} is not an element"),
                })
            }
        }
        self.ops.push(HostOp::UpdateInstance { id: *instance });
        Ok(())
    }

    fn commit_text_update(&mut self, instance: &HostNodeId, text: &str) -> Result<(), HostError> {
        match &mut self.node_mut(*instance)?.kind {
            HostNodeKind::Text(content) => *content = text.to_owned(),
            _ => {
                return Err(HostError::Rejected {
                    reason: format!("{instance} is not a text node"),
                })
            }
        }
        self.ops.push(HostOp::UpdateText {
            id: *instance,
            text: text.to_owned(),
        });
        Ok(())
    }

    /// Frees a detached instance and its subtree. Attached instances are
    /// freed along with the detached ancestor they hang from.
    fn discard_instance(&mut self, instance: &HostNodeId) {
        let detached = matches!(
            self.node(*instance),
            Ok(node) if node.parent.is_none() && node.kind != HostNodeKind::Container
        );
        if detached {
            self.release(*instance);
            self.ops.push(HostOp::Discard { id: *instance });
        }
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("live", &self.len())
            .field("ops", &self.ops.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_child_frees_the_subtree() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let div = host
            .create_instance("div", &Props::new().with("id", "a"))
            .expect("div");
        let text = host.create_text_instance("hi").expect("text");
        host.append_initial_child(&div, &text).expect("append");
        host.append_child_to_container(&container, &div).expect("insert");

        assert_eq!(host.to_markup(container), "<div id=\"a\">hi</div>");
        assert!(host.contains(container, text));

        host.remove_child(&div, &container).expect("remove");
        assert!(!host.is_live(div));
        assert!(!host.is_live(text));
        assert!(host.children(container).is_empty());
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn removing_from_the_wrong_parent_is_rejected() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let other = host.create_container();
        let text = host.create_text_instance("x").expect("text");
        host.append_child_to_container(&container, &text).expect("insert");

        assert_eq!(
            host.remove_child(&text, &other),
            Err(HostError::NotAttached {
                child: "#2".into(),
                parent: "#1".into(),
            })
        );
        assert!(host.append_initial_child(&text, &other).is_err());
    }

    #[test]
    fn updates_replace_attributes_and_text() {
        let mut host = MemoryHost::new();
        let div = host
            .create_instance("div", &Props::new().with("title", "a").with("hidden", true))
            .expect("div");
        host.commit_instance_update(&div, &Props::new().with("title", "b"))
            .expect("update");
        assert_eq!(host.to_markup(div), "<div title=\"b\"></div>");

        let text = host.create_text_instance("old").expect("text");
        host.commit_text_update(&text, "new").expect("update");
        assert_eq!(host.text(text), Some("new"));
        assert!(host.commit_text_update(&div, "nope").is_err());
        assert_eq!(host.take_ops().len(), 4);
        assert!(host.ops().is_empty());
    }

    #[test]
    fn discard_frees_only_detached_instances() {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let span = host.create_instance("span", &Props::new()).expect("span");
        let text = host.create_text_instance("x").expect("text");
        host.append_initial_child(&span, &text).expect("append");
        let kept = host.create_text_instance("kept").expect("text");
        host.append_child_to_container(&container, &kept).expect("insert");
        host.take_ops();

        host.discard_instance(&text);
        host.discard_instance(&kept);
        host.discard_instance(&container);
        assert!(host.is_live(text));
        assert!(host.is_live(kept));

        host.discard_instance(&span);
        host.discard_instance(&text);
        assert!(!host.is_live(span));
        assert!(!host.is_live(text));
        assert_eq!(host.len(), 2);
        assert_eq!(host.take_ops(), vec![HostOp::Discard { id: span }]);
    }
}
