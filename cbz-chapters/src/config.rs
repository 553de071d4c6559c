use camino::Utf8PathBuf;

pub static DEFAULT_OUTPUT_NAME: &str = "_output";

static SCRATCH_ARCHIVE_NAME: &str = ".tmp.zip";

/// Where the run reads its archives from and writes its chapters to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_directory: Utf8PathBuf,
    pub output_name: String,
    pub progress: bool,
}

impl Config {
    #[must_use]
    pub fn new(base_directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            progress: true,
        }
    }

    #[must_use]
    pub fn set_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    #[must_use]
    pub fn set_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn output_directory(&self) -> Utf8PathBuf {
        self.base_directory.join(&self.output_name)
    }

    /// Copy of the volume being processed, the original is never opened for writing
    #[must_use]
    pub fn scratch_archive(&self) -> Utf8PathBuf {
        self.base_directory.join(SCRATCH_ARCHIVE_NAME)
    }

    /// Hidden directory the volume is extracted to, named after its number
    #[must_use]
    pub fn volume_scratch_directory(&self, volume: u32) -> Utf8PathBuf {
        self.base_directory.join(format!(".{volume}"))
    }

    /// Final component of the base directory, used to label progress output
    #[must_use]
    pub fn series_title(&self) -> &str {
        self.base_directory
            .file_name()
            .unwrap_or(self.base_directory.as_str())
    }
}
