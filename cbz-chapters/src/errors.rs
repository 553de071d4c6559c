use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("output directory {0} already exists, remove it before running again")]
    OutputExists(Utf8PathBuf),

    #[error("no volume number (v followed by 1 to 3 digits, not all zeros) found in {0}")]
    VolumeNumber(String),

    #[error("invalid file name {0}: no chapter token (c followed by 3 digits, not all zeros), please fix it first")]
    ChapterToken(String),

    #[error("invalid file name {0}: no page token (p followed by 3 digits), please fix it first")]
    PageToken(String),

    #[error("scratch path {0} already exists, a previous run may have been interrupted")]
    ScratchExists(Utf8PathBuf),

    #[error("refusing to overwrite existing archive {0}")]
    ArchiveExists(Utf8PathBuf),

    #[error("{0:?} is not a valid utf-8 path")]
    NonUtf8Path(std::path::PathBuf),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Cbz error: {0}")]
    Cbz(#[from] cbz::Error),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
