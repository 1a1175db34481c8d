use polars::prelude::*;
use std::path::Path;

pub mod aggregate;
pub mod columns;
mod error;
pub mod filter;
pub mod fixture;
pub mod jornada;
pub mod lineup;
pub mod names;
pub mod performance;
pub mod position;
pub mod report;
pub mod similarity;
pub mod summary;

pub use aggregate::{AggregateOptions, Aggregator, MinutesRule, PlayerTotalsDf};
pub use error::Error;
pub use jornada::Jornada;
pub use names::TeamNameMapping;
pub use performance::PerformanceDf;

pub type Result<T> = std::result::Result<T, error::Error>;

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}
