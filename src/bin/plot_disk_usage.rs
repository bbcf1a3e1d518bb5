use clap::{App, Arg};
use index_disk_usage::{init_tracing, plot, report};
use std::{path::PathBuf, process};
use tracing::info;

fn main() {
    init_tracing();

    let matches = App::new("plot-disk-usage")
        .version("0.1")
        .about("Summarizes and plots the CSV written by measure-index-column-disk-usage")
        .arg(Arg::with_name("CSV")
            .help("CSV file with disk usage rows")
            .required(true)
            .index(1))
        .arg(Arg::with_name("PNG")
            .help("Output chart path (defaults to the CSV path with a .png extension)")
            .index(2))
        .arg(Arg::with_name("top")
            .long("top")
            .takes_value(true)
            .default_value("5")
            .help("Number of largest increments to list"))
        .get_matches();

    let csv_path = PathBuf::from(matches.value_of("CSV").unwrap_or_default());
    let png_path = matches
        .value_of("PNG")
        .map(PathBuf::from)
        .unwrap_or_else(|| csv_path.with_extension("png"));
    let top = match matches.value_of("top").unwrap_or("5").parse::<usize>() {
        Ok(top) => top,
        Err(err) => {
            eprintln!("invalid --top: {}", err);
            process::exit(1);
        }
    };

    let rows = match report::read_rows(&csv_path) {
        Ok(rows) => rows,
        Err(err) => {
            eprintln!("{}: {}", csv_path.display(), err);
            process::exit(1);
        }
    };
    report::print_summary(&rows, top);

    if let Err(err) = plot::plot_disk_usage(&rows, &png_path) {
        eprintln!("{}: {}", png_path.display(), err);
        process::exit(1);
    }
    info!(path = %png_path.display(), "wrote chart");
}
