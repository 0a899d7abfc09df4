use serde::{Deserialize, Serialize};

use crate::suppression::SuppressionController;
use crate::tree::{ContentTree, NodeId};

pub const ON_MESSAGE: &str = "ON";
pub const OFF_MESSAGE: &str = "OFF";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    #[default]
    Enabled,
    Disabled,
}

/// Inbound control message: `{"message": "ON"}`; any other string means off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSignal {
    pub message: String,
}

impl ToggleSignal {
    #[must_use]
    pub fn on() -> Self {
        Self {
            message: ON_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn off() -> Self {
        Self {
            message: OFF_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn requested_state(&self) -> ToggleState {
        if self.message == ON_MESSAGE {
            ToggleState::Enabled
        } else {
            ToggleState::Disabled
        }
    }
}

/// Follow-up work the caller owes after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Re-scan every item currently in the tree
    Rescan,
    /// Strip suppression from every item currently in the tree
    Sweep,
}

/// Owns the process-wide enabled/disabled state.
#[derive(Debug, Default)]
pub struct ToggleController {
    state: ToggleState,
}

impl ToggleController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.state
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state == ToggleState::Enabled
    }

    /// Apply a signal. Repeated signals repeat their action.
    pub fn handle(&mut self, signal: &ToggleSignal) -> ToggleAction {
        let next = signal.requested_state();
        if next != self.state {
            log::info!("Suppression {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        match next {
            ToggleState::Enabled => ToggleAction::Rescan,
            ToggleState::Disabled => ToggleAction::Sweep,
        }
    }

    /// Blanket visual reset: remove the effect from every given node,
    /// whatever its stored classification. Returns how many nodes were swept.
    pub fn sweep(
        &self,
        tree: &mut ContentTree,
        suppression: &SuppressionController,
        nodes: &[NodeId],
    ) -> usize {
        for node in nodes {
            suppression.remove(tree, *node);
        }
        log::info!("Cleared suppression from {} item(s)", nodes.len());
        nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suppression::SuppressionConfig;
    use crate::tree::NodeSpec;

    #[test]
    fn test_starts_enabled() {
        let toggle = ToggleController::new();
        assert!(toggle.is_enabled());
        assert_eq!(toggle.state(), ToggleState::Enabled);
    }

    #[test]
    fn test_only_exact_on_enables() {
        assert_eq!(ToggleSignal::on().requested_state(), ToggleState::Enabled);
        for message in ["OFF", "on", "On", "", "ON ", "yes"] {
            let signal = ToggleSignal {
                message: message.to_string(),
            };
            assert_eq!(signal.requested_state(), ToggleState::Disabled, "{message:?}");
        }
    }

    #[test]
    fn test_transitions_and_actions() {
        let mut toggle = ToggleController::new();
        assert_eq!(toggle.handle(&ToggleSignal::off()), ToggleAction::Sweep);
        assert!(!toggle.is_enabled());
        assert_eq!(toggle.handle(&ToggleSignal::off()), ToggleAction::Sweep);
        assert_eq!(toggle.handle(&ToggleSignal::on()), ToggleAction::Rescan);
        assert!(toggle.is_enabled());
        assert_eq!(toggle.handle(&ToggleSignal::on()), ToggleAction::Rescan);
    }

    #[test]
    fn test_signal_wire_format() {
        let signal: ToggleSignal = serde_json::from_str(r#"{"message":"ON"}"#).unwrap();
        assert_eq!(signal, ToggleSignal::on());
        assert_eq!(
            serde_json::to_string(&ToggleSignal::off()).unwrap(),
            r#"{"message":"OFF"}"#
        );
    }

    #[test]
    fn test_sweep_clears_every_node() {
        let mut tree = ContentTree::new();
        let suppression = SuppressionController::new(&SuppressionConfig::default());
        let document = tree.document();
        let nodes: Vec<NodeId> = (0..3)
            .map(|_| tree.append_child(document, NodeSpec::new("div")).unwrap())
            .collect();
        suppression.apply(&mut tree, nodes[0]);
        suppression.apply(&mut tree, nodes[2]);

        let toggle = ToggleController::new();
        assert_eq!(toggle.sweep(&mut tree, &suppression, &nodes), 3);
        assert!(nodes.iter().all(|n| !suppression.is_suppressed(&tree, *n)));
    }
}
