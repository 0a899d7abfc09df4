//! Feed edits: the stream of structural changes a renderer applies to the
//! observed container. Read as JSON lines; each line is one mutation batch
//! (a single edit object or an array of edits).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::selector::Selector;
use crate::tree::NodeSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FeedEdit {
    /// Append an item; `text: null` appends one with no text sub-node.
    Append {
        #[serde(default)]
        text: Option<String>,
    },
    /// Remove the `index`-th item currently in the container.
    Remove { index: usize },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedLine {
    Many(Vec<FeedEdit>),
    One(FeedEdit),
}

/// Parse one feed line. Blank lines and `//` comments yield `None`.
///
/// # Errors
///
/// Returns an error if the line is not a valid edit or edit array.
pub fn parse_line(line: &str) -> Result<Option<Vec<FeedEdit>>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }
    let parsed: FeedLine =
        serde_json::from_str(line).with_context(|| format!("Invalid feed line: {line}"))?;
    Ok(Some(match parsed {
        FeedLine::Many(edits) => edits,
        FeedLine::One(edit) => vec![edit],
    }))
}

/// Forward every batch read from `reader` to `tx`. Malformed lines are
/// logged and skipped. Returns the number of batches forwarded.
///
/// # Errors
///
/// Returns an error if reading fails.
pub async fn read_feed<R>(reader: R, tx: mpsc::Sender<Vec<FeedEdit>>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(batch)) => {
                if tx.send(batch).await.is_err() {
                    log::debug!("Pipeline stopped, no longer reading the feed");
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => {}
            Err(e) => log::warn!("{e:#}"),
        }
    }
    Ok(forwarded)
}

/// Builds item subtrees shaped so the configured selectors find them:
/// `item > article > text-node > span`.
#[derive(Debug, Clone)]
pub struct FeedTemplate {
    item: Selector,
    text: Selector,
}

impl FeedTemplate {
    #[must_use]
    pub fn new(item: Selector, text: Selector) -> Self {
        Self { item, text }
    }

    #[must_use]
    pub fn item(&self, text: Option<&str>) -> NodeSpec {
        let body = match text {
            Some(text) => NodeSpec::new("article").child(
                self.text
                    .stamp(NodeSpec::new("div"))
                    .child(NodeSpec::new("span").text(text)),
            ),
            None => NodeSpec::new("aside"),
        };
        self.item.stamp(NodeSpec::new("div")).child(body)
    }
}
