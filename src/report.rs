use crate::{error::Result, measure::DiskUsageRow};
use csv::ReaderBuilder;
use std::path::Path;

pub fn read_rows(path: &Path) -> Result<Vec<DiskUsageRow>> {
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn print_summary(rows: &[DiskUsageRow], n: usize) {
    for line in summary_lines(rows, n) {
        println!("{}", line);
    }
}

/// Summary of a measurement run: final totals, then the `n` largest
/// increments.
pub fn summary_lines(rows: &[DiskUsageRow], n: usize) -> Vec<String> {
    let last = match rows.last() {
        Some(last) => last,
        None => return vec!["No disk usage rows.".to_string()],
    };
    let mut lines = vec![
        format!("Data records: {}", last.n_records),
        format!("Terms: {}", last.n_terms),
        format!("Total disk usage: {}", format_disk_usage(last.disk_usage)),
    ];
    if last.n_records > 0 {
        lines.push(format!("Bytes per record: {:.2}", last.disk_usage as f64 / last.n_records as f64));
    }

    lines.push(format!("Top {} increments:", n));
    for row in top_n_increments(rows, n) {
        lines.push(format!(
            "  +{} at {} records ({} terms)",
            format_disk_usage(row.increment),
            row.n_records,
            row.n_terms
        ));
    }
    lines
}

/// The `n` rows with the largest increments, largest first. Ties keep file
/// order.
pub fn top_n_increments(rows: &[DiskUsageRow], n: usize) -> Vec<DiskUsageRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.increment.cmp(&a.increment));
    sorted.truncate(n);
    sorted
}

/// Formats a byte count in binary units. Column files grow by whole
/// segments, so exact multiples print without decimals ("256 KiB").
pub fn format_disk_usage(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut unit = 1024u64;
    let mut i = 0;
    while i + 1 < UNITS.len() && bytes >= unit * 1024 {
        unit *= 1024;
        i += 1;
    }

    if bytes % unit == 0 {
        format!("{} {}", bytes / unit, UNITS[i])
    } else {
        format!("{:.2} {}", bytes as f64 / unit as f64, UNITS[i])
    }
}
