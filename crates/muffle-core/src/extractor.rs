use crate::selector::Selector;
use crate::tree::{ContentTree, NodeId};

/// Locates the text-bearing sub-node of a candidate item and reads its text.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    text_selector: Selector,
}

impl ItemExtractor {
    #[must_use]
    pub fn new(text_selector: Selector) -> Self {
        Self { text_selector }
    }

    #[must_use]
    pub fn text_selector(&self) -> &Selector {
        &self.text_selector
    }

    /// Raw text of the first matching sub-node, or `None` if the candidate
    /// has no such sub-node (and is therefore not a classifiable item).
    #[must_use]
    pub fn extract(&self, tree: &ContentTree, candidate: NodeId) -> Option<String> {
        let text_node = tree.query_first(candidate, &self.text_selector)?;
        Some(tree.inner_text(text_node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    fn extractor() -> ItemExtractor {
        ItemExtractor::new("[data-testid='tweetText']".parse().unwrap())
    }

    #[test]
    fn test_extracts_nested_text() {
        let mut tree = ContentTree::new();
        let item = tree
            .append_child(
                tree.document(),
                NodeSpec::new("div").child(
                    NodeSpec::new("div")
                        .attr("data-testid", "tweetText")
                        .child(NodeSpec::new("span").text("you are "))
                        .child(NodeSpec::new("span").text("garbage")),
                ),
            )
            .unwrap();

        assert_eq!(extractor().extract(&tree, item).as_deref(), Some("you are garbage"));
    }

    #[test]
    fn test_missing_sub_node_is_a_miss() {
        let mut tree = ContentTree::new();
        let item = tree
            .append_child(tree.document(), NodeSpec::new("div").text("ad slot"))
            .unwrap();
        assert_eq!(extractor().extract(&tree, item), None);
    }

    #[test]
    fn test_empty_sub_node_yields_empty_text() {
        let mut tree = ContentTree::new();
        let item = tree
            .append_child(
                tree.document(),
                NodeSpec::new("div").child(NodeSpec::new("div").attr("data-testid", "tweetText")),
            )
            .unwrap();
        assert_eq!(extractor().extract(&tree, item).as_deref(), Some(""));
    }

    #[test]
    fn test_does_not_trim() {
        let mut tree = ContentTree::new();
        let item = tree
            .append_child(
                tree.document(),
                NodeSpec::new("div").child(
                    NodeSpec::new("p")
                        .attr("data-testid", "tweetText")
                        .text("\n  hi  \n"),
                ),
            )
            .unwrap();
        assert_eq!(extractor().extract(&tree, item).as_deref(), Some("\n  hi  \n"));
    }
}
