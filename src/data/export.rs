use std::path::Path;

use anyhow::{Context, Result};

use super::predict::PredictionReport;

/// Suggested file name for the download.
pub const EXPORT_FILE_NAME: &str = "previsoes_modelos.csv";

const HEADER: [&str; 2] = ["Model", "Prediction"];

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Render the successful predictions as CSV, header first, one row per model.
pub fn to_csv(report: &PredictionReport) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).context("writing CSV header")?;
    for (model, label) in report.successes() {
        writer
            .write_record([model, label.class.as_str()])
            .with_context(|| format!("writing CSV row for {model}"))?;
    }

    let bytes = writer.into_inner().context("flushing CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Parse an exported file back into `(model, prediction)` pairs.
#[cfg(test)]
pub fn parse_csv(text: &str) -> Result<Vec<(String, String)>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().context("reading CSV headers")?;
    anyhow::ensure!(
        headers.iter().eq(HEADER),
        "expected header Model,Prediction, found {}",
        headers.iter().collect::<Vec<_>>().join(",")
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let model = record.get(0).unwrap_or("").to_string();
        let prediction = record.get(1).unwrap_or("").to_string();
        rows.push((model, prediction));
    }
    Ok(rows)
}

/// Write the CSV export to `path` as UTF-8.
pub fn save_csv(report: &PredictionReport, path: &Path) -> Result<()> {
    let text = to_csv(report)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} prediction(s) to {}", report.rows().len(), path.display());
    Ok(())
}
