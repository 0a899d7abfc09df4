use crate::selector::Selector;
use crate::toggle::ToggleController;
use crate::tree::{ContentTree, MutationRecord, NodeId, TreeError};

/// Observes the subtree under one container and turns each mutation batch
/// into the full list of currently matching item candidates.
#[derive(Debug)]
pub struct ChangeWatcher {
    container_id: String,
    item_selector: Selector,
    container: Option<NodeId>,
    connected: bool,
}

impl ChangeWatcher {
    #[must_use]
    pub fn new(container_id: impl Into<String>, item_selector: Selector) -> Self {
        Self {
            container_id: container_id.into(),
            item_selector,
            container: None,
            connected: false,
        }
    }

    /// Start (or restart) observing. Mutations queued before this call are
    /// not reported.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingContainer`] if the container is not in the tree.
    pub fn observe(&mut self, tree: &mut ContentTree) -> Result<NodeId, TreeError> {
        let container = tree
            .find_by_id(&self.container_id)
            .ok_or_else(|| TreeError::MissingContainer(self.container_id.clone()))?;
        tree.take_records();
        self.container = Some(container);
        self.connected = true;
        log::debug!("Observing #{} ({container})", self.container_id);
        Ok(container)
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            log::debug!("Stopped observing #{}", self.container_id);
        }
        self.connected = false;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Every node under the container matching the item selector, in document order.
    #[must_use]
    pub fn candidates(&self, tree: &ContentTree) -> Vec<NodeId> {
        match self.container {
            Some(container) if tree.contains(container) => {
                tree.query_all(container, &self.item_selector)
            }
            _ => Vec::new(),
        }
    }

    /// Drain the pending mutation batch. Returns the candidates to re-scan,
    /// or `None` when the batch needs no action: nothing relevant changed,
    /// the watcher is disconnected, or suppression is disabled.
    pub fn poll(
        &mut self,
        tree: &mut ContentTree,
        toggle: &ToggleController,
    ) -> Option<Vec<NodeId>> {
        let records = tree.take_records();
        if !self.connected || records.is_empty() {
            return None;
        }
        if !self.is_relevant(tree, &records) {
            return None;
        }
        if !toggle.is_enabled() {
            log::debug!("Ignoring {} mutation(s) while disabled", records.len());
            return None;
        }
        Some(self.candidates(tree))
    }

    fn is_relevant(&self, tree: &ContentTree, records: &[MutationRecord]) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        records
            .iter()
            .any(|record| tree.is_within(record.target, container))
    }
}
