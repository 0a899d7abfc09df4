//! In-memory content tree observed by the pipeline.
//!
//! Nodes are addressed by [`NodeId`], which stays valid (and is never reused)
//! for the lifetime of the tree. Structural edits queue [`MutationRecord`]s
//! that an observer drains with [`ContentTree::take_records`]; style writes
//! are not structural and queue nothing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::selector::Selector;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} is not in the tree")]
    UnknownNode(NodeId),
    #[error("the document node cannot be removed")]
    RemoveDocument,
    #[error("no container with id '{0}'")]
    MissingContainer(String),
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Presentation properties the pipeline is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub style: Style,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Blueprint for a subtree inserted with [`ContentTree::append_child`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// One structural change: nodes added to or removed from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug)]
pub struct ContentTree {
    nodes: HashMap<NodeId, Node>,
    document: NodeId,
    next_id: u64,
    records: Vec<MutationRecord>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    #[must_use]
    pub fn new() -> Self {
        let document = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            document,
            Node {
                tag: "#document".to_string(),
                attributes: BTreeMap::new(),
                text: String::new(),
                style: Style::default(),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            document,
            next_id: 1,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Option<&mut Style> {
        self.nodes.get_mut(&id).map(|node| &mut node.style)
    }

    /// Insert `spec` (and its whole subtree) as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `parent` is not in the tree.
    pub fn append_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        let id = self.build(parent, spec);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        self.records.push(MutationRecord {
            target: parent,
            added: vec![id],
            removed: Vec::new(),
        });
        Ok(id)
    }

    fn build(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: spec.tag,
                attributes: spec.attributes,
                text: spec.text,
                style: Style::default(),
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        let children: Vec<NodeId> = spec
            .children
            .into_iter()
            .map(|child| self.build(id, child))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// Detach `id` and drop its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error for the document node or a node not in the tree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.document {
            return Err(TreeError::RemoveDocument);
        }
        let parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::UnknownNode(id))?
            .parent;

        for gone in self.subtree(id) {
            self.nodes.remove(&gone);
        }
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|child| *child != id);
            }
            self.records.push(MutationRecord {
                target: parent,
                added: Vec::new(),
                removed: vec![id],
            });
        }
        Ok(())
    }

    /// Drain queued mutation records. One drain is one mutation batch.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// `id` followed by all its descendants, in document order.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Descendants of `scope` (excluding `scope`) in document order.
    #[must_use]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut all = self.subtree(scope);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    #[must_use]
    pub fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|node| selector.matches(node)))
            .collect()
    }

    #[must_use]
    pub fn query_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(|node| selector.matches(node)))
    }

    #[must_use]
    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|id| self.nodes.get(id).and_then(|n| n.attribute("id")) == Some(element_id))
    }

    /// Text of `id` and its descendants concatenated in document order, unmodified.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .filter_map(|node| self.nodes.get(&node))
            .map(|node| node.text.as_str())
            .collect()
    }

    /// True if `id` is `ancestor` or lies below it.
    #[must_use]
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(&node).and_then(Node::parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> NodeSpec {
        NodeSpec::new("div").attr("data-testid", "cellInnerDiv").child(
            NodeSpec::new("article").child(
                NodeSpec::new("div")
                    .attr("data-testid", "tweetText")
                    .child(NodeSpec::new("span").text(text)),
            ),
        )
    }

    fn feed() -> (ContentTree, NodeId) {
        let mut tree = ContentTree::new();
        let root = tree
            .append_child(tree.document(), NodeSpec::new("div").attr("id", "react-root"))
            .unwrap();
        tree.take_records();
        (tree, root)
    }

    #[test]
    fn test_append_records_one_mutation() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("hello")).unwrap();

        let records = tree.take_records();
        assert_eq!(
            records,
            vec![MutationRecord {
                target: root,
                added: vec![id],
                removed: vec![],
            }]
        );
        assert!(tree.take_records().is_empty());
    }

    #[test]
    fn test_append_to_unknown_parent_fails() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("x")).unwrap();
        tree.remove(id).unwrap();
        assert_eq!(
            tree.append_child(id, NodeSpec::new("p")),
            Err(TreeError::UnknownNode(id))
        );
    }

    #[test]
    fn test_remove_drops_subtree() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("bye")).unwrap();
        let inner = tree.descendants(id);
        assert_eq!(inner.len(), 3);

        tree.remove(id).unwrap();
        assert!(!tree.contains(id));
        assert!(inner.iter().all(|n| !tree.contains(*n)));
        assert!(tree.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_cannot_remove_document() {
        let mut tree = ContentTree::new();
        assert_eq!(tree.remove(tree.document()), Err(TreeError::RemoveDocument));
    }

    #[test]
    fn test_query_all_in_document_order() {
        let (mut tree, root) = feed();
        let a = tree.append_child(root, cell("a")).unwrap();
        let b = tree.append_child(root, cell("b")).unwrap();
        let selector: Selector = "[data-testid='cellInnerDiv']".parse().unwrap();

        assert_eq!(tree.query_all(root, &selector), vec![a, b]);
    }

    #[test]
    fn test_query_first_is_scoped() {
        let (mut tree, root) = feed();
        let a = tree.append_child(root, cell("a")).unwrap();
        let lonely = tree
            .append_child(root, NodeSpec::new("div").attr("data-testid", "cellInnerDiv"))
            .unwrap();
        let text: Selector = "[data-testid='tweetText']".parse().unwrap();

        assert!(tree.query_first(a, &text).is_some());
        assert!(tree.query_first(lonely, &text).is_none());
    }

    #[test]
    fn test_inner_text_is_unmodified() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("  spaced out\n")).unwrap();
        assert_eq!(tree.inner_text(id), "  spaced out\n");
    }

    #[test]
    fn test_find_by_id_and_is_within() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("x")).unwrap();

        assert_eq!(tree.find_by_id("react-root"), Some(root));
        assert_eq!(tree.find_by_id("missing"), None);
        assert!(tree.is_within(id, root));
        assert!(!tree.is_within(root, id));
    }

    #[test]
    fn test_style_writes_are_not_mutations() {
        let (mut tree, root) = feed();
        let id = tree.append_child(root, cell("x")).unwrap();
        tree.take_records();

        tree.style_mut(id).unwrap().filter = Some("blur(1.5rem)".to_string());
        assert!(tree.take_records().is_empty());
    }
}
