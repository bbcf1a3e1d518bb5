use index_disk_usage::{
    cli::{self, Args},
    database::prepare_database,
    generator::ValueGenerator,
    init_tracing,
    measure::{measure_disk_usage, MeasureConfig},
    Error, Result,
};
use std::{
    env,
    ffi::OsString,
    io::{self, Write},
    process,
};
use tracing::info;

fn run(args: Args) -> Result<()> {
    let mut db = prepare_database(&args)?;

    let stdout = io::stdout();
    let summary = measure_disk_usage(
        &mut db,
        ValueGenerator::new(args.n_postings_per_term),
        stdout.lock(),
        &MeasureConfig::default(),
    )?;
    db.sync()?;

    info!(rows = summary.n_rows, last = ?summary.last_row, "measurement finished");
    Ok(())
}

fn main() {
    init_tracing();

    let argv: Vec<OsString> = env::args_os().collect();
    let program = argv
        .first()
        .map(|program| program.to_string_lossy().into_owned())
        .unwrap_or_else(|| "measure-index-column-disk-usage".to_string());

    let args = match cli::parse_args(argv) {
        Ok(args) => args,
        Err(Error::Usage) => {
            print!("{}", cli::usage(&program));
            let _ = io::stdout().flush();
            process::exit(1);
        }
        Err(err) => {
            eprintln!("{}: {}", program, err);
            process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{}: {}", program, err);
        process::exit(1);
    }
}
