pub mod cli;
pub mod database;
pub mod engine;
pub mod error;
pub mod generator;
pub mod index_column;
pub mod lexicon;
pub mod measure;
pub mod patricia;
pub mod plot;
pub mod report;
pub mod schema;
pub mod storage;
pub mod table;

pub use database::Database;
pub use engine::IndexEngine;
pub use error::{Error, Result};
pub use index_column::IndexFlags;

use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays pure CSV. `RUST_LOG` overrides the
/// default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
