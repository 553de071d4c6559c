//! Sorts the loose pages of an extracted volume into `Vol. n Ch. m` folders.
//!
//! Every page name is parsed before anything is moved, so a single malformed
//! page leaves the whole volume directory untouched.

use std::{collections::HashSet, fs};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::{
    errors::Result,
    matcher::{chapter_folder_name, extract_chapter_token, extract_page_token, is_page_image},
    progress::Progress,
    utils::sorted_entries,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMove {
    pub source: Utf8PathBuf,
    pub chapter_folder: Utf8PathBuf,
    pub destination: Utf8PathBuf,
}

/// Computes where every page of `volume_directory` belongs, without touching the disk
///
/// ## Errors
///
/// Fails on the first page missing its chapter or page token, or if the directory can't be listed
pub fn plan(volume: u32, volume_directory: &Utf8Path) -> Result<Vec<PageMove>> {
    let mut moves = Vec::new();

    for entry in sorted_entries(volume_directory)? {
        if entry.is_dir || !is_page_image(&entry.name) {
            continue;
        }

        let chapter = extract_chapter_token(&entry.name)?;
        let page = extract_page_token(&entry.name)?;
        let chapter_folder = volume_directory.join(chapter_folder_name(volume, chapter));

        moves.push(PageMove {
            destination: chapter_folder.join(page.file_name()),
            chapter_folder,
            source: entry.path,
        });
    }

    Ok(moves)
}

/// Moves every page of `volume_directory` into its chapter folder under its canonical name.
/// Returns the amount of moved pages.
///
/// Two pages sharing a chapter and page token end up at the same destination,
/// the last one moved wins.
///
/// ## Errors
///
/// Fails before moving anything if a page name is invalid,
/// otherwise fails on the first folder creation or move error
pub fn distribute(
    volume: u32,
    volume_directory: &Utf8Path,
    title: &str,
    progress: &mut dyn Progress,
) -> Result<usize> {
    let moves = plan(volume, volume_directory)?;

    let mut destinations = HashSet::new();
    for page_move in &moves {
        if !destinations.insert(&page_move.destination) {
            warn!(
                "{} will overwrite another page at {}",
                page_move.source, page_move.destination
            );
        }
    }

    progress.start(title, moves.len());
    for (i, page_move) in moves.iter().enumerate() {
        fs::create_dir_all(&page_move.chapter_folder)?;
        fs::rename(&page_move.source, &page_move.destination)?;
        debug!("moved {} to {}", page_move.source, page_move.destination);
        progress.advance(i + 1);
    }
    progress.finish();

    Ok(moves.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{errors::Error, matcher::is_chapter_folder};

    /// Keeps every event for later inspection
    #[derive(Debug, Default)]
    pub(crate) struct RecordingProgress {
        pub(crate) titles: Vec<(String, usize)>,
        pub(crate) advances: Vec<usize>,
        pub(crate) finished: usize,
        pub(crate) statuses: Vec<String>,
    }

    impl Progress for RecordingProgress {
        fn start(&mut self, title: &str, total: usize) {
            self.titles.push((title.to_string(), total));
        }

        fn advance(&mut self, done: usize) {
            self.advances.push(done);
        }

        fn finish(&mut self) {
            self.finished += 1;
        }

        fn status(&mut self, tag: &str, message: &str) {
            self.statuses.push(format!("[{tag}] {message}"));
        }
    }

    fn volume_directory(pages: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap().join(".1");
        fs::create_dir(&root).unwrap();
        for (name, content) in pages {
            fs::write(root.join(name), content).unwrap();
        }
        (temp_dir, root)
    }

    #[test]
    fn test_distribute_moves_pages_into_chapter_folders() {
        let (_temp_dir, root) = volume_directory(&[
            ("c001_p001.jpg", "one"),
            ("c001_p002.jpg", "two"),
            ("c002_p001.png", "three"),
            ("c002_p002-p003.JPG", "spread"),
            ("ComicInfo.xml", "<xml/>"),
        ]);
        let mut progress = RecordingProgress::default();

        let moved = distribute(1, &root, "[BUILDING] Series/.1", &mut progress).unwrap();

        assert_eq!(moved, 4);
        assert_eq!(fs::read(root.join("Vol. 1 Ch. 1/001.jpg")).unwrap(), b"one");
        assert_eq!(fs::read(root.join("Vol. 1 Ch. 1/002.jpg")).unwrap(), b"two");
        assert_eq!(fs::read(root.join("Vol. 1 Ch. 2/001.png")).unwrap(), b"three");
        assert_eq!(fs::read(root.join("Vol. 1 Ch. 2/002-003.JPG")).unwrap(), b"spread");
        assert!(!root.join("c001_p001.jpg").exists());
        assert!(root.join("ComicInfo.xml").exists());

        assert_eq!(progress.titles, vec![("[BUILDING] Series/.1".to_string(), 4)]);
        assert_eq!(progress.advances, vec![1, 2, 3, 4]);
        assert_eq!(progress.finished, 1);
    }

    #[test]
    fn test_every_chapter_folder_is_packageable() {
        let (_temp_dir, root) = volume_directory(&[
            ("Series v12 c140_p001.jpg", ""),
            ("Series v12 c009_p001.jpg", ""),
        ]);

        for page_move in plan(12, &root).unwrap() {
            let name = page_move.chapter_folder.file_name().unwrap();
            assert!(is_chapter_folder(name), "{name} isn't a chapter folder");
        }

        fs::write(root.join("Series v12 c000_p001.jpg"), "").unwrap();
        assert!(matches!(
            plan(12, &root),
            Err(Error::ChapterToken(name)) if name == "Series v12 c000_p001.jpg"
        ));
        assert!(root.join("Series v12 c000_p001.jpg").exists());
    }

    #[test]
    fn test_invalid_page_aborts_before_any_move() {
        let (_temp_dir, root) = volume_directory(&[
            ("c001_p001.jpg", "one"),
            ("c001_p002.jpg", "two"),
            ("c001_cover.jpg", "cover"),
        ]);
        let mut progress = RecordingProgress::default();

        let res = distribute(1, &root, "title", &mut progress);

        assert!(matches!(res, Err(Error::PageToken(name)) if name == "c001_cover.jpg"));
        assert!(root.join("c001_p001.jpg").exists());
        assert!(root.join("c001_p002.jpg").exists());
        assert!(!root.join("Vol. 1 Ch. 1").exists());
        assert!(progress.titles.is_empty());
    }

    #[test]
    fn test_missing_chapter_token_is_fatal() {
        let (_temp_dir, root) = volume_directory(&[("cover_p001.jpg", "")]);

        let res = distribute(1, &root, "title", &mut RecordingProgress::default());

        assert!(matches!(res, Err(Error::ChapterToken(_))));
    }

    #[test]
    fn test_duplicate_destination_last_write_wins() {
        let (_temp_dir, root) = volume_directory(&[
            ("a_c001_p001.jpg", "first"),
            ("b_c001_p001.jpg", "second"),
        ]);

        let moved = distribute(1, &root, "title", &mut RecordingProgress::default()).unwrap();

        assert_eq!(moved, 2);
        assert_eq!(fs::read(root.join("Vol. 1 Ch. 1/001.jpg")).unwrap(), b"second");
        assert_eq!(fs::read_dir(root.join("Vol. 1 Ch. 1")).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_volume() {
        let (_temp_dir, root) = volume_directory(&[]);
        let mut progress = RecordingProgress::default();

        assert_eq!(distribute(3, &root, "title", &mut progress).unwrap(), 0);
        assert_eq!(progress.titles, vec![("title".to_string(), 0)]);
        assert_eq!(progress.finished, 1);
    }
}
