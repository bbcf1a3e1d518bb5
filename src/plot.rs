use crate::{
    error::{Error, Result},
    measure::DiskUsageRow,
};
use plotters::{coord::Shift, prelude::*};
use std::{fmt::Display, path::Path};

fn plot_error<E: Display>(err: E) -> Error {
    Error::Plot(err.to_string())
}

/// Renders total disk usage (top) and per-row increments (bottom) against
/// the number of data records.
pub fn plot_disk_usage(rows: &[DiskUsageRow], output_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(output_path, (1280, 960)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let (upper, lower) = root.split_vertically(480);

    let (x_axis_upper_bound, usage_upper_bound) = chart_bounds(rows, |row| row.disk_usage);
    plot_records_to_bytes_chart(
        &upper,
        rows.iter().map(|row| (row.n_records, row.disk_usage)).collect(),
        x_axis_upper_bound,
        usage_upper_bound,
        "Data Records vs Index Column Disk Usage (bytes)",
        "Data Records",
        "Disk Usage (bytes)",
    )?;

    let (_, increment_upper_bound) = chart_bounds(rows, |row| row.increment);
    plot_records_to_bytes_chart(
        &lower,
        rows.iter().map(|row| (row.n_records, row.increment)).collect(),
        x_axis_upper_bound,
        increment_upper_bound,
        "Data Records vs Disk Usage Increment (bytes)",
        "Data Records",
        "Increment (bytes)",
    )?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Exclusive axis bounds covering every row; never empty.
fn chart_bounds(rows: &[DiskUsageRow], y: impl Fn(&DiskUsageRow) -> u64) -> (u64, u64) {
    let x_axis_upper_bound = rows.iter().map(|row| row.n_records).max().unwrap_or(0) + 1;
    let y_axis_upper_bound = rows.iter().map(y).max().unwrap_or(0) + 1;
    (x_axis_upper_bound, y_axis_upper_bound)
}

fn plot_records_to_bytes_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: Vec<(u64, u64)>,
    x_axis_upper_bound: u64,
    y_axis_upper_bound: u64,
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0..x_axis_upper_bound, 0..y_axis_upper_bound)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(data, &BLUE))
        .map_err(plot_error)?;

    Ok(())
}
