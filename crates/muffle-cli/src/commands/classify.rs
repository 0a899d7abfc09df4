/// One-off classification of texts given on the command line
use anyhow::{Context, Result};
use muffle_ai::Classifier;
use muffle_core::Config;
use tabled::{Table, Tabled};

use super::helpers::truncate_str;

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "Text")]
    text: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Violating")]
    violating: String,
}

pub async fn classify_texts(texts: Vec<String>) -> Result<()> {
    let config = Config::load()?;
    let classifier = Classifier::from_config(&config.service, config.examples.clone())?;

    let verdicts = classifier
        .classify_many(&texts)
        .await
        .context("Classification request failed")?;
    if verdicts.len() != texts.len() {
        log::warn!(
            "Sent {} text(s) but received {} prediction(s)",
            texts.len(),
            verdicts.len()
        );
    }

    let rows: Vec<VerdictRow> = texts
        .iter()
        .zip(verdicts)
        .map(|(text, verdict)| VerdictRow {
            text: truncate_str(text, 48),
            prediction: verdict.prediction,
            confidence: verdict
                .confidence
                .map_or_else(|| "-".to_string(), |c| format!("{:.1}%", c * 100.0)),
            violating: if verdict.violating { "yes" } else { "no" }.to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}
