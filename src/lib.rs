pub mod accumulator;
pub mod config;
pub mod rates;
pub mod reader;
pub mod record;
pub mod report;

pub use accumulator::{Accumulator, ConfusionBucket, ingest};
pub use rates::{RatePair, derive_rates};
pub use record::Record;
