#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::env;

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use cbz_chapters::{
    config::DEFAULT_OUTPUT_NAME, run, Config, ConsoleProgress, Progress, SilentProgress,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// The directory containing the volume and loose chapter archives, defaults to the current directory
    pub base_directory: Option<Utf8PathBuf>,
    /// Name of the directory created inside the base directory to hold the chapters, must not exist yet
    #[clap(long, default_value = DEFAULT_OUTPUT_NAME)]
    pub output_name: String,
    /// Hide progress bars and status lines
    #[clap(long, action)]
    pub no_progress: bool,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let base_directory = match args.base_directory {
        Some(base_directory) => base_directory,
        None => {
            let Ok(current_dir) = Utf8PathBuf::from_path_buf(env::current_dir()?) else {
                bail!("current dir is not a valid utf-8 path");
            };
            current_dir
        }
    };

    let config = Config::new(base_directory)
        .set_output_name(args.output_name)
        .set_progress(!args.no_progress);

    let mut progress: Box<dyn Progress> = if config.progress {
        Box::new(ConsoleProgress::new())
    } else {
        Box::new(SilentProgress)
    };

    let summary = run(&config, progress.as_mut())?;

    if config.progress {
        println!(
            "{} chapters created in {}",
            summary.chapters.len() + summary.loose_chapters.len(),
            config.output_directory()
        );
    }

    Ok(())
}
