use crate::{
    error::{Error, Result},
    index_column::IndexFlags,
};
use clap::{App, AppSettings, Arg};
use std::{ffi::OsString, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_dir: PathBuf,
    pub flags: IndexFlags,
    pub n_postings_per_term: u32,
}

impl Args {
    /// Database file inside the (wiped) database directory.
    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join("db")
    }
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} DB_DIR WITH_POSITION WITH_SECTION N_POSTINGS_PER_TERM\n e.g.: {program} db true false 100\n",
        program = program
    )
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("measure-index-column-disk-usage")
        .about("Measures index column disk usage while inserting synthetic records")
        .setting(AppSettings::DisableHelpFlags)
        .setting(AppSettings::DisableVersion)
        .setting(AppSettings::AllowLeadingHyphen)
        .arg(Arg::with_name("DB_DIR")
            .help("Directory to wipe and create the database in")
            .required(true)
            .index(1))
        .arg(Arg::with_name("WITH_POSITION")
            .help("\"true\" to store positions in postings")
            .required(true)
            .index(2))
        .arg(Arg::with_name("WITH_SECTION")
            .help("\"true\" to store sections in postings")
            .required(true)
            .index(3))
        .arg(Arg::with_name("N_POSTINGS_PER_TERM")
            .help("Records inserted per distinct value")
            .required(true)
            .index(4))
}

/// Parses `argv` (program name first). Anything but exactly four
/// arguments after the program name is `Error::Usage`; every token counts,
/// `--` included.
pub fn parse_args<I, T>(argv: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if argv.len() != 5 {
        return Err(Error::Usage);
    }
    // Everything after a leading `--` is taken literally by clap.
    argv.insert(1, OsString::from("--"));
    let matches = app().get_matches_from_safe(argv).map_err(|_| Error::Usage)?;

    let value_of = |name: &str| matches.value_of_os(name).ok_or(Error::Usage);
    let db_dir = PathBuf::from(value_of("DB_DIR")?);
    let flags = IndexFlags {
        with_position: value_of("WITH_POSITION")? == "true",
        with_section: value_of("WITH_SECTION")? == "true",
    };
    let n_postings = value_of("N_POSTINGS_PER_TERM")?.to_string_lossy();
    let n_postings_per_term = n_postings
        .parse::<u32>()
        .map_err(|source| Error::InvalidPostingsPerTerm {
            value: n_postings.to_string(),
            source,
        })?;

    Ok(Args {
        db_dir,
        flags,
        n_postings_per_term,
    })
}
