use anyhow::{Context, Result};
use muffle_ai::{Classifier, ClassifyError, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::{Config, ConfigError};
use crate::extractor::ItemExtractor;
use crate::feed::{FeedEdit, FeedTemplate};
use crate::ipc::{ControlCommand, ControlEnvelope, ControlRequest, ControlResponse};
use crate::item::{ClassificationState, ContentItem};
use crate::suppression::SuppressionController;
use crate::toggle::{ToggleAction, ToggleController, ToggleSignal, ToggleState};
use crate::tree::{ContentTree, NodeId, NodeSpec, TreeError};
use crate::watcher::ChangeWatcher;

/// Completion of one classification request, delivered back to the loop.
#[derive(Debug)]
pub struct Resolution {
    pub node: NodeId,
    pub outcome: Result<Verdict, ClassifyError>,
}

/// What a single scan did with the candidates it was handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub candidates: usize,
    pub dispatched: usize,
    /// Candidates whose earlier request is still in flight
    pub reused: usize,
    /// Candidates without a text sub-node
    pub skipped: usize,
    /// Candidates whose text is empty
    pub empty: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub enabled: bool,
    pub watching: bool,
    pub items: usize,
    pub unclassified: usize,
    pub pending: usize,
    pub toxic: usize,
    pub benign: usize,
    pub errors: usize,
    pub suppressed: usize,
    pub in_flight: usize,
}

/// One feed item as currently shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedItem {
    pub node: NodeId,
    pub text: Option<String>,
    pub state: ClassificationState,
    pub prediction: Option<String>,
    pub suppressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

enum LoopEvent {
    Feed(Option<Vec<FeedEdit>>),
    Control(Option<ControlEnvelope>),
    Resolved(Resolution),
    Interrupted,
}

/// The classification-and-suppression pipeline.
///
/// Everything here runs on one logical event queue: feed batches, control
/// messages and classification completions are handled one at a time by
/// [`Pipeline::run`]. Requests run as spawned tasks and report back through
/// an internal channel; their results are applied under the toggle state at
/// resolution time.
pub struct Pipeline {
    tree: ContentTree,
    container: NodeId,
    items: HashMap<NodeId, ContentItem>,
    in_flight: HashSet<NodeId>,
    watcher: ChangeWatcher,
    extractor: ItemExtractor,
    suppression: SuppressionController,
    toggle: ToggleController,
    template: FeedTemplate,
    classifier: Arc<Classifier>,
    resolutions_tx: mpsc::UnboundedSender<Resolution>,
    resolutions: mpsc::UnboundedReceiver<Resolution>,
}

impl Pipeline {
    /// Build the pipeline around a fresh container and start observing it.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured selector is invalid.
    pub fn new(config: &Config, classifier: Classifier) -> Result<Self, ConfigError> {
        let (item_selector, text_selector) = config.feed.selectors()?;

        let mut tree = ContentTree::new();
        let document = tree.document();
        let container = tree.append_child(
            document,
            NodeSpec::new("div").attr("id", config.feed.root_id.clone()),
        )?;

        let mut watcher = ChangeWatcher::new(config.feed.root_id.clone(), item_selector.clone());
        watcher.observe(&mut tree)?;

        let (resolutions_tx, resolutions) = mpsc::unbounded_channel();
        Ok(Self {
            tree,
            container,
            items: HashMap::new(),
            in_flight: HashSet::new(),
            watcher,
            extractor: ItemExtractor::new(text_selector.clone()),
            suppression: SuppressionController::new(&config.suppression),
            toggle: ToggleController::new(),
            template: FeedTemplate::new(item_selector, text_selector),
            classifier: Arc::new(classifier),
            resolutions_tx,
            resolutions,
        })
    }

    /// Build the pipeline with the configured HTTP classifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available or the config is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = Classifier::from_config(&config.service, config.examples.clone())
            .context("Failed to set up the classifier")?;
        Ok(Self::new(config, classifier)?)
    }

    #[must_use]
    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Direct access for hosts that edit the tree themselves; follow edits
    /// with [`Pipeline::process_mutations`].
    pub fn tree_mut(&mut self) -> &mut ContentTree {
        &mut self.tree
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn toggle_state(&self) -> ToggleState {
        self.toggle.state()
    }

    #[must_use]
    pub fn item(&self, node: NodeId) -> Option<&ContentItem> {
        self.items.get(&node)
    }

    #[must_use]
    pub fn is_suppressed(&self, node: NodeId) -> bool {
        self.suppression.is_suppressed(&self.tree, node)
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Current item candidates in document order.
    #[must_use]
    pub fn candidates(&self) -> Vec<NodeId> {
        self.watcher.candidates(&self.tree)
    }

    pub fn disconnect(&mut self) {
        self.watcher.disconnect();
    }

    /// Resume observing. Item state is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the container has left the tree.
    pub fn reconnect(&mut self) -> Result<(), TreeError> {
        self.watcher.observe(&mut self.tree).map(|_| ())
    }

    /// Apply one batch of feed edits, then handle the resulting mutations.
    pub fn apply_feed(&mut self, edits: Vec<FeedEdit>) -> Option<ScanReport> {
        for edit in edits {
            match edit {
                FeedEdit::Append { text } => {
                    let spec = self.template.item(text.as_deref());
                    if let Err(e) = self.tree.append_child(self.container, spec) {
                        log::warn!("Feed append failed: {e}");
                    }
                }
                FeedEdit::Remove { index } => match self.candidates().get(index) {
                    Some(&node) => {
                        if let Err(e) = self.tree.remove(node) {
                            log::warn!("Feed remove failed: {e}");
                        }
                    }
                    None => log::warn!("Feed remove: no item at index {index}"),
                },
            }
        }
        self.process_mutations()
    }

    /// Handle the pending mutation batch: forget detached items and, if the
    /// watcher reports the batch, re-scan every current candidate.
    pub fn process_mutations(&mut self) -> Option<ScanReport> {
        let tree = &self.tree;
        self.items.retain(|node, _| tree.contains(*node));

        let candidates = self.watcher.poll(&mut self.tree, &self.toggle)?;
        Some(self.scan(&candidates))
    }

    /// Apply a toggle signal: enabling re-scans, disabling strips suppression
    /// from every current candidate without touching stored classifications.
    pub fn handle_signal(&mut self, signal: &ToggleSignal) -> Option<ScanReport> {
        let candidates = self.candidates();
        match self.toggle.handle(signal) {
            ToggleAction::Rescan => Some(self.scan(&candidates)),
            ToggleAction::Sweep => {
                self.toggle
                    .sweep(&mut self.tree, &self.suppression, &candidates);
                None
            }
        }
    }

    fn scan(&mut self, candidates: &[NodeId]) -> ScanReport {
        let mut report = ScanReport {
            candidates: candidates.len(),
            ..ScanReport::default()
        };

        for &node in candidates {
            let Some(text) = self.extractor.extract(&self.tree, node) else {
                report.skipped += 1;
                continue;
            };

            let item = self
                .items
                .entry(node)
                .or_insert_with(|| ContentItem::new(node));
            item.text = Some(text.clone());

            if text.is_empty() {
                report.empty += 1;
                continue;
            }
            if self.in_flight.contains(&node) {
                report.reused += 1;
                continue;
            }

            item.mark_pending();
            self.dispatch(node, text);
            report.dispatched += 1;
        }

        log::info!(
            "Scanned {} candidate(s): {} dispatched, {} in flight, {} without text",
            report.candidates,
            report.dispatched,
            report.reused,
            report.skipped + report.empty
        );
        report
    }

    fn dispatch(&mut self, node: NodeId, text: String) {
        self.in_flight.insert(node);
        let classifier = Arc::clone(&self.classifier);
        let tx = self.resolutions_tx.clone();

        log::debug!("Classifying {node}");
        tokio::spawn(async move {
            let outcome = classifier.classify(&text).await;
            if tx.send(Resolution { node, outcome }).is_err() {
                log::debug!("Pipeline gone, dropping result for {node}");
            }
        });
    }

    /// Record a completed request and render its effect. Suppression is
    /// applied only if the label is violating and the pipeline is enabled now.
    pub fn apply_resolution(&mut self, resolution: Resolution) {
        let Resolution { node, outcome } = resolution;
        self.in_flight.remove(&node);

        let Some(item) = self.items.get_mut(&node) else {
            log::debug!("Dropping result for {node}: item left the feed");
            return;
        };
        let state = item.resolve(&outcome);

        match &outcome {
            Ok(verdict) => log::debug!(
                "{node} classified '{}' ({:?})",
                verdict.prediction,
                verdict.confidence
            ),
            Err(e) => log::warn!("Classification failed for {node}, leaving it visible: {e}"),
        }

        if state == ClassificationState::Toxic {
            if self.toggle.is_enabled() {
                self.suppression.apply(&mut self.tree, node);
            } else {
                log::debug!("{node} is toxic but suppression is disabled");
            }
        } else if self.suppression.is_suppressed(&self.tree, node) {
            self.suppression.remove(&mut self.tree, node);
        }
    }

    /// Wait for the next completion and apply it.
    pub async fn resolve_next(&mut self) -> Option<NodeId> {
        let resolution = self.resolutions.recv().await?;
        let node = resolution.node;
        self.apply_resolution(resolution);
        Some(node)
    }

    /// Apply completions until nothing is in flight.
    pub async fn settle(&mut self) {
        while !self.in_flight.is_empty() {
            if self.resolve_next().await.is_none() {
                break;
            }
        }
    }

    pub fn handle_control(&mut self, request: ControlRequest) -> (Option<ControlResponse>, Flow) {
        match request {
            ControlRequest::Toggle(signal) => {
                self.handle_signal(&signal);
                (None, Flow::Continue)
            }
            ControlRequest::Command {
                command: ControlCommand::Status,
            } => (Some(ControlResponse::Status(self.snapshot())), Flow::Continue),
            ControlRequest::Command {
                command: ControlCommand::Stop,
            } => {
                log::info!("Stop requested over the control socket");
                (Some(ControlResponse::Stopped { stopped: true }), Flow::Stop)
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        let mut snapshot = PipelineSnapshot {
            enabled: self.toggle.is_enabled(),
            watching: self.watcher.is_connected(),
            items: self.items.len(),
            in_flight: self.in_flight.len(),
            ..PipelineSnapshot::default()
        };
        for (node, item) in &self.items {
            match item.state {
                ClassificationState::Unclassified => snapshot.unclassified += 1,
                ClassificationState::Pending => snapshot.pending += 1,
                ClassificationState::Toxic => snapshot.toxic += 1,
                ClassificationState::Benign => snapshot.benign += 1,
                ClassificationState::Error => snapshot.errors += 1,
            }
            if self.is_suppressed(*node) {
                snapshot.suppressed += 1;
            }
        }
        snapshot
    }

    /// Every candidate in document order with its classification and effect.
    #[must_use]
    pub fn render(&self) -> Vec<RenderedItem> {
        self.candidates()
            .into_iter()
            .map(|node| {
                let item = self.items.get(&node);
                RenderedItem {
                    node,
                    text: item
                        .and_then(|i| i.text.clone())
                        .or_else(|| self.extractor.extract(&self.tree, node)),
                    state: item.map_or(ClassificationState::Unclassified, |i| i.state),
                    prediction: item.and_then(|i| i.prediction.clone()),
                    suppressed: self.is_suppressed(node),
                }
            })
            .collect()
    }

    async fn next_event(
        &mut self,
        feed: &mut mpsc::Receiver<Vec<FeedEdit>>,
        feed_open: bool,
        control: &mut mpsc::Receiver<ControlEnvelope>,
        control_open: bool,
    ) -> LoopEvent {
        tokio::select! {
            edits = feed.recv(), if feed_open => LoopEvent::Feed(edits),
            envelope = control.recv(), if control_open => LoopEvent::Control(envelope),
            Some(resolution) = self.resolutions.recv() => LoopEvent::Resolved(resolution),
            _ = tokio::signal::ctrl_c() => LoopEvent::Interrupted,
        }
    }

    /// Run the event loop until stopped over the control channel, interrupted,
    /// or (with `exit_when_drained`) the feed has ended and nothing is in flight.
    pub async fn run(
        &mut self,
        mut feed: mpsc::Receiver<Vec<FeedEdit>>,
        mut control: mpsc::Receiver<ControlEnvelope>,
        exit_when_drained: bool,
    ) -> PipelineSnapshot {
        let mut feed_open = true;
        let mut control_open = true;
        log::info!("Pipeline started ({:?})", self.toggle.state());

        loop {
            match self
                .next_event(&mut feed, feed_open, &mut control, control_open)
                .await
            {
                LoopEvent::Feed(Some(edits)) => {
                    self.apply_feed(edits);
                }
                LoopEvent::Feed(None) => {
                    log::info!("Feed ended");
                    feed_open = false;
                }
                LoopEvent::Control(Some(envelope)) => {
                    let (reply, flow) = self.handle_control(envelope.request);
                    if envelope.reply.send(reply).is_err() {
                        log::debug!("Control client went away before the reply");
                    }
                    if flow == Flow::Stop {
                        break;
                    }
                }
                LoopEvent::Control(None) => control_open = false,
                LoopEvent::Resolved(resolution) => self.apply_resolution(resolution),
                LoopEvent::Interrupted => {
                    log::info!("Received Ctrl-C, shutting down...");
                    break;
                }
            }

            if exit_when_drained && !feed_open && self.in_flight.is_empty() {
                break;
            }
        }

        let snapshot = self.snapshot();
        log::info!(
            "Pipeline stopped: {} item(s), {} suppressed, {} still in flight",
            snapshot.items,
            snapshot.suppressed,
            snapshot.in_flight
        );
        snapshot
    }
}
