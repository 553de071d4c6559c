#![deny(clippy::all)]
#![deny(clippy::pedantic)]

//! Turns a directory of volume archives (`Series v1.cbz`, ...) and loose chapter archives
//! into one `Vol. n Ch. m.cbz` archive per chapter.

pub use crate::{
    config::Config,
    errors::{Error, Result},
    orchestrate::{discover, run, Inputs, Summary},
    progress::{ConsoleProgress, Progress, SilentProgress},
};

pub mod config;
pub mod distribute;
pub mod errors;
pub mod matcher;
pub mod orchestrate;
pub mod package;
pub mod progress;
mod utils;
