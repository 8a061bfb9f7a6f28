//! CLI argument definitions

mod args;

pub use args::{Args, ConfigCommand, SubCommand};
