/// Pipeline process: feed reader, control socket and event loop
use anyhow::{Context, Result};
use muffle_core::{
    config::get_data_dir,
    feed::read_feed,
    ipc::listen,
    Config, Pipeline, RenderedItem,
};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tokio::{io::BufReader, sync::mpsc};

use super::helpers::preview;

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Text")]
    text: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Blurred")]
    blurred: String,
}

impl ItemRow {
    fn from_rendered(index: usize, item: &RenderedItem) -> Self {
        Self {
            index,
            text: preview(item.text.as_deref(), 48),
            state: item.state.to_string(),
            prediction: item.prediction.clone().unwrap_or_else(|| "-".to_string()),
            blurred: if item.suppressed { "yes" } else { "no" }.to_string(),
        }
    }
}

pub async fn run_pipeline(feed: Option<PathBuf>, once: bool) -> Result<()> {
    let config = Config::load()?;
    let mut pipeline = Pipeline::from_config(&config)?;

    let (feed_tx, feed_rx) = mpsc::channel(64);
    let (control_tx, control_rx) = mpsc::channel(16);

    let sock_path = get_data_dir()?.join("muffle.sock");
    tokio::spawn(async move {
        if let Err(e) = listen(control_tx, &sock_path).await {
            log::error!("Control socket failed: {e}");
        }
    });

    match feed {
        Some(path) if path.as_os_str() == "-" => {
            tokio::spawn(async move {
                if let Err(e) = read_feed(BufReader::new(tokio::io::stdin()), feed_tx).await {
                    log::error!("Reading feed from stdin failed: {e:#}");
                }
            });
        }
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open feed {}", path.display()))?;
            tokio::spawn(async move {
                match read_feed(BufReader::new(file), feed_tx).await {
                    Ok(batches) => log::info!("Read {batches} batch(es) from {}", path.display()),
                    Err(e) => log::error!("Reading feed {} failed: {e:#}", path.display()),
                }
            });
        }
        None => drop(feed_tx),
    }

    let snapshot = pipeline.run(feed_rx, control_rx, once).await;

    let rows: Vec<ItemRow> = pipeline
        .render()
        .iter()
        .enumerate()
        .map(|(i, item)| ItemRow::from_rendered(i, item))
        .collect();
    if rows.is_empty() {
        println!("Feed is empty.");
    } else {
        println!("{}", Table::new(rows));
    }
    println!(
        "{} item(s): {} toxic, {} benign, {} failed, {} blurred",
        snapshot.items, snapshot.toxic, snapshot.benign, snapshot.errors, snapshot.suppressed
    );
    Ok(())
}

pub fn setup_file_logging(log_path: &Path) -> Result<()> {
    use std::fs::{create_dir_all, OpenOptions};

    if let Some(parent) = log_path.parent() {
        create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .init();

    Ok(())
}
