pub mod config;
pub mod extractor;
pub mod feed;
pub mod ipc;
pub mod item;
pub mod pipeline;
pub mod selector;
pub mod suppression;
pub mod toggle;
pub mod tree;
pub mod watcher;

pub use config::Config;
pub use extractor::ItemExtractor;
pub use feed::FeedEdit;
pub use item::{ClassificationState, ContentItem};
pub use pipeline::{Pipeline, PipelineSnapshot, RenderedItem, ScanReport};
pub use selector::Selector;
pub use suppression::SuppressionController;
pub use toggle::{ToggleController, ToggleSignal, ToggleState};
pub use tree::{ContentTree, NodeId, NodeSpec};
pub use watcher::ChangeWatcher;
