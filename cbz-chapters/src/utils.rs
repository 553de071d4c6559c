use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::error;

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: Utf8PathBuf,
    pub is_dir: bool,
}

/// Immediate children of `directory`, sorted by name.
/// Entries whose name isn't valid utf-8 can't be matched against any pattern and are left out.
pub fn sorted_entries(directory: &Utf8Path) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            error!("{:?} is not a valid utf-8 path", entry.path());
            continue;
        };
        let is_dir = entry.file_type()?.is_dir();

        entries.push(Entry {
            path: directory.join(&name),
            name,
            is_dir,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();
        fs::write(root.join("b.cbz"), b"").unwrap();
        fs::write(root.join("a.cbz"), b"").unwrap();
        fs::create_dir(root.join("c")).unwrap();

        let entries = sorted_entries(root).unwrap();
        let names = entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.cbz", "b.cbz", "c"]);
        assert_eq!(entries[0].path, root.join("a.cbz"));
        assert!(!entries[1].is_dir);
        assert!(entries[2].is_dir);
    }
}
