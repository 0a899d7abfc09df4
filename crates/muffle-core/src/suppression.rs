use serde::{Deserialize, Serialize};

use crate::tree::{ContentTree, NodeId};

pub const DEFAULT_EFFECT: &str = "blur(1.5rem)";
pub const DEFAULT_CLEAR: &str = "blur(0)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// `filter` value that obscures an item
    pub filter: String,
    /// `filter` value written when the effect is removed
    pub clear_filter: String,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_EFFECT.to_string(),
            clear_filter: DEFAULT_CLEAR.to_string(),
        }
    }
}

/// Applies and removes the visual suppression effect on item nodes.
///
/// Both operations only write the node's `filter` style, so they are
/// idempotent and never destroy content. Unknown nodes are ignored.
#[derive(Debug, Clone)]
pub struct SuppressionController {
    effect: String,
    clear: String,
}

impl SuppressionController {
    #[must_use]
    pub fn new(config: &SuppressionConfig) -> Self {
        Self {
            effect: config.filter.clone(),
            clear: config.clear_filter.clone(),
        }
    }

    pub fn apply(&self, tree: &mut ContentTree, node: NodeId) {
        if let Some(style) = tree.style_mut(node) {
            style.filter = Some(self.effect.clone());
        }
    }

    pub fn remove(&self, tree: &mut ContentTree, node: NodeId) {
        if let Some(style) = tree.style_mut(node) {
            style.filter = Some(self.clear.clone());
        }
    }

    #[must_use]
    pub fn is_suppressed(&self, tree: &ContentTree, node: NodeId) -> bool {
        tree.node(node)
            .and_then(|n| n.style.filter.as_deref())
            .is_some_and(|filter| filter == self.effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    fn setup() -> (ContentTree, NodeId, SuppressionController) {
        let mut tree = ContentTree::new();
        let node = tree
            .append_child(tree.document(), NodeSpec::new("div").text("content"))
            .unwrap();
        (tree, node, SuppressionController::new(&SuppressionConfig::default()))
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (mut tree, node, controller) = setup();
        controller.apply(&mut tree, node);
        let once = tree.node(node).unwrap().style.clone();
        controller.apply(&mut tree, node);

        assert_eq!(tree.node(node).unwrap().style, once);
        assert!(controller.is_suppressed(&tree, node));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut tree, node, controller) = setup();
        controller.apply(&mut tree, node);
        controller.remove(&mut tree, node);
        let once = tree.node(node).unwrap().style.clone();
        controller.remove(&mut tree, node);

        assert_eq!(tree.node(node).unwrap().style, once);
        assert_eq!(once.filter.as_deref(), Some(DEFAULT_CLEAR));
        assert!(!controller.is_suppressed(&tree, node));
    }

    #[test]
    fn test_effect_keeps_content() {
        let (mut tree, node, controller) = setup();
        controller.apply(&mut tree, node);
        assert_eq!(tree.inner_text(node), "content");
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let (mut tree, node, controller) = setup();
        tree.remove(node).unwrap();
        controller.apply(&mut tree, node);
        controller.remove(&mut tree, node);
        assert!(!controller.is_suppressed(&tree, node));
    }

    #[test]
    fn test_fresh_node_is_not_suppressed() {
        let (tree, node, controller) = setup();
        assert!(!controller.is_suppressed(&tree, node));
    }
}
