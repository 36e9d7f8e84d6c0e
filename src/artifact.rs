//! Artifact writer: serializes result rows to the tabular output file and
//! returns its stable internal reference.

use std::path::{Path, PathBuf};

use crate::orchestrator::ResultRow;

/// Writes `rows` (sorted by `store_id` ascending) as a UTF-8, LF-terminated
/// CSV with the header from §4.8, to `<dir>/<report_id>.csv`.
///
/// Returns the internal `file://` reference; [`to_public_url`] translates
/// it for the HTTP layer.
pub fn write_artifact(dir: &Path, report_id: &str, mut rows: Vec<ResultRow>) -> std::io::Result<String> {
    rows.sort_by(|a, b| a.store_id.cmp(&b.store_id));

    std::fs::create_dir_all(dir)?;
    let path: PathBuf = dir.join(format!("{report_id}.csv"));

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(&path)?;

    writer.write_record([
        "store_id",
        "uptime_last_hour",
        "uptime_last_day",
        "uptime_last_week",
        "downtime_last_hour",
        "downtime_last_day",
        "downtime_last_week",
    ])?;

    for row in &rows {
        writer.write_record([
            row.store_id.as_str(),
            &row.uptime_last_hour.to_string(),
            &format!("{:.2}", row.uptime_last_day_hours),
            &format!("{:.2}", row.uptime_last_week_hours),
            &row.downtime_last_hour.to_string(),
            &format!("{:.2}", row.downtime_last_day_hours),
            &format!("{:.2}", row.downtime_last_week_hours),
        ])?;
    }
    writer.flush()?;

    Ok(format!("file://{}", path.display()))
}

/// Translates an internal artifact reference into the public download URL.
///
/// Preserves a legacy quirk from an earlier JSON-artifact revision of the
/// source system: any trailing extension is rewritten to `.csv` regardless
/// of what it originally was. Non-`file://` references pass through
/// unchanged.
pub fn to_public_url(internal_ref: &str) -> String {
    let Some(rest) = internal_ref.strip_prefix("file://") else {
        return internal_ref.to_string();
    };
    let path = Path::new(rest);
    let Some(file_name) = path.file_stem().and_then(|s| s.to_str()) else {
        return internal_ref.to_string();
    };
    format!("/files/reports/{file_name}.csv")
}
