// Offline evaluation: run the severity predictor over a labelled incident CSV
// and report agreement with the labels as JSON.
//
// Usage:
//   cargo run --bin batch_triage -- <dataset.csv> [model_path]
//
// Without a model path (or when it fails to load) the rule-based classifier is evaluated.

use disaster_triage::config::triage_config::DEFAULT_MODEL_PATH;
use disaster_triage::engine::{evaluate, SeverityPredictor};
use disaster_triage::importer::LabeledDatasetImporter;
use disaster_triage::logging;
use serde_json::json;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let dataset_path = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: batch_triage <dataset.csv> [model_path]")?;
    let model_path = args.next().unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());

    let dataset = LabeledDatasetImporter::import_file(&dataset_path)?;
    let predictor = SeverityPredictor::load(&model_path);
    let report = evaluate(&predictor, &dataset);

    let output = json!({
        "dataset": dataset_path.display().to_string(),
        "model_path": model_path,
        "skipped_rows": dataset.skipped,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
