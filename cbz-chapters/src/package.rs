use std::{
    fs::{self, File},
    io::BufWriter,
};

use camino::{Utf8Path, Utf8PathBuf};
use cbz::{CbzWrite, CbzWriter};
use glob::{glob, Pattern};
use tracing::{debug, error, info, warn};

use crate::{
    errors::{Error, Result},
    matcher::is_chapter_folder,
    progress::Progress,
    utils::sorted_entries,
};

static PARTIAL_SUFFIX: &str = ".part";

/// Archives every `Vol. n Ch. m` folder of `volume_directory` into `output_directory`,
/// then deletes `volume_directory` along with anything that wasn't archived.
/// Returns the paths of the created archives.
///
/// ## Errors
///
/// Fails if an archive can't be written, in which case `volume_directory` is kept
pub fn package(
    output_directory: &Utf8Path,
    volume_directory: &Utf8Path,
    progress: &mut dyn Progress,
) -> Result<Vec<Utf8PathBuf>> {
    let mut archives = Vec::new();

    for entry in sorted_entries(volume_directory)? {
        if !entry.is_dir || !is_chapter_folder(&entry.name) {
            debug!("not a chapter folder, skipping {}", entry.path);
            continue;
        }

        progress.status("COMPRESSING", &entry.name);
        let destination = output_directory.join(format!("{}.cbz", entry.name));
        let pages = pack_folder(&entry.path, &destination)?;
        info!("packed {pages} pages into {destination}");
        archives.push(destination);
    }

    progress.status("CLEANING UP", &format!("Deleting {volume_directory}"));
    fs::remove_dir_all(volume_directory)?;

    Ok(archives)
}

/// Zips every file found under `folder`, entries are named after their path relative to `folder`.
/// The archive is written next to `destination` first, and only moved into place once complete.
/// Returns the amount of archived files.
///
/// ## Errors
///
/// Fails if `destination` already exists or if any file can't be archived
pub fn pack_folder(folder: &Utf8Path, destination: &Utf8Path) -> Result<usize> {
    if destination.exists() {
        return Err(Error::ArchiveExists(destination.to_path_buf()));
    }

    let files = folder_files(folder)?;
    let partial = Utf8PathBuf::from(format!("{destination}{PARTIAL_SUFFIX}"));

    let cbz_writer = CbzWriter::create_new(&partial)?;
    if let Err(err) = write_archive(cbz_writer, &partial, &files) {
        error!("failed to write {partial}: {err}");
        if let Err(remove_err) = fs::remove_file(&partial) {
            warn!("couldn't remove {partial}: {remove_err}");
        }
        return Err(err);
    }

    fs::rename(&partial, destination)?;

    Ok(files.len())
}

/// `(entry name, path)` of every file under `folder`, sorted by entry name
fn folder_files(folder: &Utf8Path) -> Result<Vec<(String, Utf8PathBuf)>> {
    let glob_expr = format!("{}/**/*", Pattern::escape(folder.as_str()));
    let mut files = Vec::new();

    for path in glob(&glob_expr)? {
        let path = path?;
        let path = Utf8PathBuf::from_path_buf(path).map_err(Error::NonUtf8Path)?;
        if !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(folder) else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/");

        files.push((name, path));
    }

    files.sort();

    Ok(files)
}

fn write_archive(
    mut cbz_writer: CbzWriter<'_, BufWriter<File>>,
    path: &Utf8Path,
    files: &[(String, Utf8PathBuf)],
) -> Result<()> {
    for (name, file) in files {
        cbz_writer.insert_path(name.as_str(), file)?;
        debug!("inserted {name} into {path}");
    }

    cbz_writer.finish()?.sync()?;

    Ok(())
}
