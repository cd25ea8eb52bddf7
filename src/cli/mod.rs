mod convert;
mod inspect;

pub use convert::*;
pub use inspect::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
