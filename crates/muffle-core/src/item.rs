use chrono::{DateTime, Utc};
use muffle_ai::{ClassifyError, Verdict};
use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

/// Where an item is in its classification lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationState {
    Unclassified,
    Pending,
    Toxic,
    Benign,
    Error,
}

impl std::fmt::Display for ClassificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unclassified => "unclassified",
            Self::Pending => "pending",
            Self::Toxic => "toxic",
            Self::Benign => "benign",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A classifiable node of the feed plus what is known about it.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub node: NodeId,
    pub text: Option<String>,
    pub state: ClassificationState,
    pub prediction: Option<String>,
    pub confidence: Option<f32>,
    pub observed_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub attempts: u32,
}

impl ContentItem {
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            text: None,
            state: ClassificationState::Unclassified,
            prediction: None,
            confidence: None,
            observed_at: Utc::now(),
            resolved_at: None,
            attempts: 0,
        }
    }

    pub fn mark_pending(&mut self) {
        self.state = ClassificationState::Pending;
        self.attempts += 1;
    }

    /// Record the outcome of the latest attempt. Returns the new state.
    pub fn resolve(&mut self, outcome: &Result<Verdict, ClassifyError>) -> ClassificationState {
        self.resolved_at = Some(Utc::now());
        match outcome {
            Ok(verdict) => {
                self.prediction = Some(verdict.prediction.clone());
                self.confidence = verdict.confidence;
                self.state = if verdict.violating {
                    ClassificationState::Toxic
                } else {
                    ClassificationState::Benign
                };
            }
            Err(_) => {
                self.prediction = None;
                self.confidence = None;
                self.state = ClassificationState::Error;
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ContentTree, NodeSpec};

    fn fresh_item() -> ContentItem {
        let mut tree = ContentTree::new();
        let node = tree
            .append_child(tree.document(), NodeSpec::new("div"))
            .unwrap();
        ContentItem::new(node)
    }

    fn verdict(prediction: &str, violating: bool) -> Verdict {
        Verdict {
            prediction: prediction.to_string(),
            confidence: Some(0.7),
            violating,
        }
    }

    #[test]
    fn test_lifecycle_to_toxic() {
        let mut item = fresh_item();
        assert_eq!(item.state, ClassificationState::Unclassified);

        item.mark_pending();
        assert_eq!(item.state, ClassificationState::Pending);
        assert_eq!(item.attempts, 1);

        let state = item.resolve(&Ok(verdict("Toxic", true)));
        assert_eq!(state, ClassificationState::Toxic);
        assert_eq!(item.prediction.as_deref(), Some("Toxic"));
        assert!(item.resolved_at.is_some());
    }

    #[test]
    fn test_non_violating_label_is_benign() {
        let mut item = fresh_item();
        item.mark_pending();
        assert_eq!(
            item.resolve(&Ok(verdict("Spam", false))),
            ClassificationState::Benign
        );
        assert_eq!(item.prediction.as_deref(), Some("Spam"));
    }

    #[test]
    fn test_failure_clears_previous_prediction() {
        let mut item = fresh_item();
        item.mark_pending();
        item.resolve(&Ok(verdict("Toxic", true)));
        item.mark_pending();

        let state = item.resolve(&Err(ClassifyError::NoPredictions));
        assert_eq!(state, ClassificationState::Error);
        assert!(item.prediction.is_none());
        assert_eq!(item.attempts, 2);
    }
}
