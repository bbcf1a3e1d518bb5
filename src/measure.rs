use crate::{
    engine::IndexEngine,
    error::{Error, Result},
};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::info;

pub const DEFAULT_MAX_RECORDS: u64 = 200_000_000;

pub const HEADER: [&str; 4] = ["# of data records", "# of terms", "total disk usage", "increment"];

/// One CSV row, emitted whenever the index column's disk usage changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsageRow {
    #[serde(rename = "# of data records")]
    pub n_records: u64,
    #[serde(rename = "# of terms")]
    pub n_terms: u64,
    #[serde(rename = "total disk usage")]
    pub disk_usage: u64,
    #[serde(rename = "increment")]
    pub increment: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureConfig {
    /// Measurement stops at the first change reported once the data table
    /// holds more records than this.
    pub max_records: u64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        MeasureConfig {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureSummary {
    pub n_rows: u64,
    pub last_row: Option<DiskUsageRow>,
}

/// Inserts `values` into `engine` one by one, writing a CSV row to `out`
/// (and flushing) every time the index column's disk usage changes.
pub fn measure_disk_usage<E, I, W>(
    engine: &mut E,
    values: I,
    out: W,
    config: &MeasureConfig,
) -> Result<MeasureSummary>
where
    E: IndexEngine,
    I: IntoIterator<Item = i32>,
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(HEADER)?;
    writer.flush()?;

    info!(max_records = config.max_records, "measuring index column disk usage");

    let mut summary = MeasureSummary::default();
    let mut previous_disk_usage = 0;
    let mut values = values.into_iter();
    loop {
        let disk_usage = engine.column_disk_usage();
        if disk_usage != previous_disk_usage {
            if disk_usage < previous_disk_usage {
                return Err(Error::DiskUsageShrank {
                    previous: previous_disk_usage,
                    current: disk_usage,
                });
            }
            let row = DiskUsageRow {
                n_records: engine.table_size(),
                n_terms: engine.lexicon_size(),
                disk_usage,
                increment: disk_usage - previous_disk_usage,
            };
            writer.serialize(row)?;
            writer.flush()?;
            previous_disk_usage = disk_usage;
            summary.n_rows += 1;
            summary.last_row = Some(row);

            if row.n_records > config.max_records {
                info!(n_records = row.n_records, disk_usage, "record limit exceeded");
                return Ok(summary);
            }
        }

        let value = match values.next() {
            Some(value) => value,
            None => {
                info!(n_records = engine.table_size(), "value generator exhausted");
                return Ok(summary);
            }
        };
        engine.insert(value)?;
    }
}
