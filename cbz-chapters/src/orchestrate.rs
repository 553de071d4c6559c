use std::{
    fs::{self, File},
    io,
};

use camino::{Utf8Path, Utf8PathBuf};
use cbz::CbzReader;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    distribute::distribute,
    errors::{Error, Result},
    matcher::{
        extract_loose_chapter_number, extract_volume_number, is_archive, is_volume_archive,
        loose_chapter_archive_name,
    },
    package::package,
    progress::Progress,
    utils::sorted_entries,
};

/// What a run produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Loose chapters copied under their new name
    pub loose_chapters: Vec<Utf8PathBuf>,
    /// Loose chapter candidates without any chapter number
    pub skipped: Vec<String>,
    /// `Vol. n Ch. m.cbz` archives built out of the volumes
    pub chapters: Vec<Utf8PathBuf>,
}

/// Input archives found in the base directory, by kind
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub volumes: Vec<Utf8PathBuf>,
    pub loose_chapters: Vec<Utf8PathBuf>,
}

/// Splits the regular files of `base_directory` into volume archives and loose chapter archives
///
/// ## Errors
///
/// Fails if the directory can't be listed
pub fn discover(base_directory: &Utf8Path) -> Result<Inputs> {
    let mut inputs = Inputs::default();

    for entry in sorted_entries(base_directory)? {
        if entry.is_dir {
            continue;
        }

        if is_volume_archive(&entry.name) {
            inputs.volumes.push(entry.path);
        } else if is_archive(&entry.name) {
            inputs.loose_chapters.push(entry.path);
        }
    }

    Ok(inputs)
}

/// Converts every archive of the configured base directory into per-chapter archives.
///
/// The output directory is created first and must not exist yet. Processing stops at the
/// first error, anything produced up to that point is left in place.
///
/// ## Errors
///
/// Fails if the output directory exists, if a volume or page name can't be parsed,
/// or on any archive or filesystem error
pub fn run(config: &Config, progress: &mut dyn Progress) -> Result<Summary> {
    let output_directory = config.output_directory();
    create_output_directory(&output_directory)?;

    let inputs = discover(&config.base_directory)?;
    info!(
        "found {} volumes and {} loose chapters in {}",
        inputs.volumes.len(),
        inputs.loose_chapters.len(),
        config.base_directory
    );

    let mut summary = Summary::default();
    rename_loose_chapters(
        &inputs.loose_chapters,
        &output_directory,
        progress,
        &mut summary,
    )?;

    for volume_path in &inputs.volumes {
        let chapters = split_volume(config, volume_path, &output_directory, progress)?;
        summary.chapters.extend(chapters);
    }

    info!(
        "created {} chapters, copied {} loose chapters, skipped {}",
        summary.chapters.len(),
        summary.loose_chapters.len(),
        summary.skipped.len()
    );

    Ok(summary)
}

fn create_output_directory(output_directory: &Utf8Path) -> Result<()> {
    match fs::create_dir(output_directory) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            Err(Error::OutputExists(output_directory.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

fn rename_loose_chapters(
    loose_chapters: &[Utf8PathBuf],
    output_directory: &Utf8Path,
    progress: &mut dyn Progress,
    summary: &mut Summary,
) -> Result<()> {
    progress.start("[RENAMING] Renaming loose chapters...", loose_chapters.len());

    for (i, path) in loose_chapters.iter().enumerate() {
        let name = path.file_name().unwrap_or(path.as_str());

        if let Some(chapter) = extract_loose_chapter_number(name) {
            let destination = output_directory.join(loose_chapter_archive_name(chapter));
            copy_archive(path, &destination)?;
            debug!("copied {path} to {destination}");
            summary.loose_chapters.push(destination);
        } else {
            warn!("no chapter number found in {name}, skipping");
            summary.skipped.push(name.to_string());
        }

        progress.advance(i + 1);
    }

    progress.finish();

    Ok(())
}

/// Copies `source` to `destination`, keeping its modification time when possible
fn copy_archive(source: &Utf8Path, destination: &Utf8Path) -> Result<()> {
    if destination.exists() {
        return Err(Error::ArchiveExists(destination.to_path_buf()));
    }

    fs::copy(source, destination)?;

    let modified = fs::metadata(source).and_then(|metadata| metadata.modified());
    let preserved = modified.and_then(|modified| {
        File::options()
            .write(true)
            .open(destination)?
            .set_modified(modified)
    });
    if let Err(err) = preserved {
        debug!("couldn't preserve modification time of {destination}: {err}");
    }

    Ok(())
}

/// Extracts a single volume next to the original archive, sorts its pages into chapters,
/// then packs these chapters into `output_directory`
fn split_volume(
    config: &Config,
    volume_path: &Utf8Path,
    output_directory: &Utf8Path,
    progress: &mut dyn Progress,
) -> Result<Vec<Utf8PathBuf>> {
    let name = volume_path.file_name().unwrap_or(volume_path.as_str());
    let volume = extract_volume_number(volume_path)?;
    let volume_directory = config.volume_scratch_directory(volume);
    if volume_directory.exists() {
        return Err(Error::ScratchExists(volume_directory));
    }

    let scratch_archive = config.scratch_archive();
    if scratch_archive.exists() {
        return Err(Error::ScratchExists(scratch_archive));
    }
    fs::copy(volume_path, &scratch_archive)?;

    progress.status(
        "EXTRACTING",
        &format!("{}/{name}", config.series_title()),
    );
    let extracted = CbzReader::from_path(&scratch_archive)
        .and_then(|mut cbz_reader| cbz_reader.extract_to(&volume_directory));
    fs::remove_file(&scratch_archive)?;
    extracted?;

    let title = format!(
        "[BUILDING] {}/{}",
        config.series_title(),
        volume_directory.file_name().unwrap_or_default()
    );
    let pages = distribute(volume, &volume_directory, &title, progress)?;
    if pages == 0 {
        warn!("no pages found at the root of {name}");
    }

    package(output_directory, &volume_directory, progress)
}
