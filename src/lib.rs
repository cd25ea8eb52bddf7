pub mod cli;
pub mod config;
pub mod convert;
pub mod record;

pub use config::Opts;
pub use convert::{ConvertOptions, Converter, Outcome, Summary};
pub use record::RawImageRecord;
