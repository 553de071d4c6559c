#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{
    fs::File,
    io::{self, BufWriter, Cursor, Read, Seek, Write},
    marker::PhantomData,
    path::Path,
    result,
};

use bytes::Bytes;
use camino::Utf8Path;
use tracing::debug;
use zip::{read::ZipFile, write::FileOptions, ZipArchive, ZipWriter};

pub use crate::errors::{Error, Result};

pub mod errors;

/// We artificially limit the amount of accepted files to 65535 files per Cbz
/// First as it'd be rather impractical for the user to read such enormous Cbz
/// Also, this size has been chosen as it was the limit of the very first zip spec
pub static MAX_FILE_NUMBER: usize = u16::MAX as usize;

pub trait Cbz {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait CbzRead: Cbz {
    /// File names as stored in the archive, directories included
    fn file_names(&self) -> Vec<&str>;

    /// Lookup the file by `name` in Cbz and returns a `CbzFile`
    ///
    /// ## Errors
    ///
    /// Fails if no file with this name exists in the archive
    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>>;

    /// Iterate over files present in the Cbz, sorted by name.
    /// If the closure returns an error, this error is returned immediately.
    ///
    /// ## Errors
    ///
    /// Returns an error immediately if the provided closure returns an error
    fn try_for_each<F, E>(&mut self, mut f: F) -> result::Result<(), E>
    where
        F: FnMut(Result<CbzFile<'_>>) -> result::Result<(), E>,
    {
        let mut file_names = self
            .file_names()
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        file_names.sort();

        for file_name in file_names {
            f(self.read_by_name(&file_name))?;
        }

        Ok(())
    }
}

pub trait CbzWrite {
    fn size(&self) -> usize;

    /// Streams the content of `reader` into a new entry called `filename`
    ///
    /// ## Errors
    ///
    /// This fails if the Cbz writer can't be written or if it's full (i.e. its size equals `MAX_FILE_NUMBER`)
    fn insert_from_reader_with_options(
        &mut self,
        filename: impl Into<String>,
        reader: &mut impl Read,
        file_options: FileOptions,
    ) -> Result<u64>;

    /// Same as `insert_from_reader_with_options` for an in-memory slice
    ///
    /// ## Errors
    ///
    /// Same behavior as `insert_from_reader_with_options`
    fn insert_from_bytes_slice_with_options(
        &mut self,
        filename: impl Into<String>,
        mut bytes: &[u8],
        file_options: FileOptions,
    ) -> Result<()> {
        self.insert_from_reader_with_options(filename, &mut bytes, file_options)?;

        Ok(())
    }

    /// Copies the file located at `path` into the archive under `filename`
    ///
    /// ## Errors
    ///
    /// Fails if the file can't be opened, or on insertion error
    fn insert_path(&mut self, filename: impl Into<String>, path: impl AsRef<Path>) -> Result<u64> {
        let mut file = File::open(path.as_ref())?;

        self.insert_from_reader_with_options(filename, &mut file, FileOptions::default())
    }
}

pub struct CbzFile<'a>(ZipFile<'a>);

impl<'a> CbzFile<'a> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn size(&self) -> u64 {
        self.0.size()
    }

    pub fn is_dir(&self) -> bool {
        self.0.is_dir()
    }

    /// Convert the file content to `Bytes`
    ///
    /// ## Errors
    ///
    /// Fails if file size is too large to fit a `usize` on host machine
    /// or if the content can't be read
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(
            self.size()
                .try_into()
                .map_err(|_| Error::CbzFileSizeConversion)?,
        );

        self.0.read_to_end(&mut buf)?;

        Ok(buf.into())
    }
}

impl<'a> From<ZipFile<'a>> for CbzFile<'a> {
    fn from(zip_file: ZipFile<'a>) -> Self {
        Self(zip_file)
    }
}

#[derive(Debug)]
pub struct CbzReader<'a, R> {
    archive: ZipArchive<R>,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a, R> CbzReader<'a, R> {
    pub fn new(archive: ZipArchive<R>) -> Self {
        Self {
            archive,
            _lifetime: PhantomData,
        }
    }
}

impl<'a, R> CbzReader<'a, R>
where
    R: Read + Seek,
{
    /// Creates `CbzReader` from a `Read`
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        Ok(Self::new(archive))
    }

    /// Extracts every entry into `directory`, creating it when missing.
    /// Entry paths are kept relative to `directory`.
    ///
    /// ## Errors
    ///
    /// Fails if an entry can't be read or written to disk, or if its path escapes `directory`
    pub fn extract_to(&mut self, directory: impl AsRef<Utf8Path>) -> Result<()> {
        let directory = directory.as_ref();
        debug!("extracting {} entries to {directory}", self.archive.len());

        self.archive.extract(directory)?;

        Ok(())
    }
}

impl<'a> CbzReader<'a, File> {
    /// Creates `CbzReader` from a path
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Self::from_reader(file)
    }
}

impl<'a, 'b> CbzReader<'a, Cursor<&'b [u8]>> {
    /// Creates `CbzReader` from a bytes slice
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_bytes_slice(bytes: &'b [u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes);

        Self::from_reader(cursor)
    }
}

impl<'a, R> Cbz for CbzReader<'a, R>
where
    R: Read + Seek,
{
    fn len(&self) -> usize {
        self.archive.len()
    }
}

impl<'a, R> CbzRead for CbzReader<'a, R>
where
    R: Read + Seek,
{
    fn file_names(&self) -> Vec<&str> {
        self.archive.file_names().collect()
    }

    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>> {
        let archive_file = self.archive.by_name(name)?;

        Ok(archive_file.into())
    }
}

pub struct CbzWriter<'a, W: Write + Seek> {
    archive: ZipWriter<W>,
    size: usize,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a, W> CbzWriter<'a, W>
where
    W: Write + Seek,
{
    pub fn new(archive: ZipWriter<W>) -> Self {
        Self {
            archive,
            size: 0,
            _lifetime: PhantomData,
        }
    }

    /// Creates a `CbzWriter` from a `Write`
    pub fn from_writer(writer: W) -> Self {
        let archive = ZipWriter::new(writer);

        Self::new(archive)
    }

    /// Terminates the Cbz archiving, called on drop anyway but error can't be handled
    ///
    /// ## Errors
    ///
    /// Same errors as the underlying `ZipWriter::finish` method
    pub fn finish(&mut self) -> Result<CbzWriterFinished<W>> {
        let writer = self.archive.finish()?;

        Ok(CbzWriterFinished::new(writer))
    }
}

impl<'a> CbzWriter<'a, BufWriter<File>> {
    /// Creates a `CbzWriter` writing to a new file at `path`
    ///
    /// ## Errors
    ///
    /// Fails if a file already exists at `path` or if it can't be created
    pub fn create_new(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create_new(path.as_ref())?;

        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<'a> Default for CbzWriter<'a, Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::from_writer(Cursor::new(Vec::new()))
    }
}

impl<'a, W> Cbz for CbzWriter<'a, W>
where
    W: Write + Seek,
{
    fn len(&self) -> usize {
        self.size
    }
}

impl<'a, W> CbzWrite for CbzWriter<'a, W>
where
    W: Write + Seek,
{
    fn size(&self) -> usize {
        self.size
    }

    fn insert_from_reader_with_options(
        &mut self,
        filename: impl Into<String>,
        reader: &mut impl Read,
        file_options: FileOptions,
    ) -> Result<u64> {
        if self.size >= MAX_FILE_NUMBER {
            return Err(Error::CbzTooLarge(MAX_FILE_NUMBER));
        }

        let filename = filename.into();
        if filename.is_empty() {
            return Err(Error::CbzFileNameEmpty);
        }

        self.archive.start_file(filename, file_options)?;

        let written = io::copy(reader, &mut self.archive)?;

        self.size += 1;

        Ok(written)
    }
}

pub struct CbzWriterFinished<W> {
    writer: W,
}

impl<W> CbzWriterFinished<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CbzWriterFinished<Cursor<Vec<u8>>> {
    /// Writes self into provided writer
    ///
    /// ## Errors
    ///
    /// Fails on write error
    pub fn write_to(self, mut writer: impl Write) -> Result<()> {
        writer.write_all(&self.writer.into_inner())?;

        Ok(())
    }

    /// Writes self into a File (that will be created) located under the provided path
    ///
    /// ## Errors
    ///
    /// Can fail on file creation or when writing the file content
    pub fn write_to_path(self, path: impl AsRef<Utf8Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        self.write_to(&mut file)?;

        Ok(())
    }
}

impl CbzWriterFinished<BufWriter<File>> {
    /// Flushes the buffered writer and waits for the file to reach the disk
    ///
    /// ## Errors
    ///
    /// Fails if the remaining buffer can't be written or synced
    pub fn sync(self) -> Result<()> {
        let file = self.writer.into_inner().map_err(io::IntoInnerError::into_error)?;

        file.sync_all()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn sample_cbz() -> Vec<u8> {
        let mut writer = CbzWriter::default();
        writer
            .insert_from_bytes_slice_with_options("002.png", b"second", FileOptions::default())
            .unwrap();
        writer
            .insert_from_bytes_slice_with_options("001.jpg", b"first", FileOptions::default())
            .unwrap();
        writer
            .insert_from_bytes_slice_with_options(
                "extra/003.jpg",
                b"nested",
                FileOptions::default(),
            )
            .unwrap();
        writer.finish().unwrap().into_inner().into_inner()
    }

    #[test]
    fn test_reader_iterates_sorted_by_name() {
        let bytes = sample_cbz();
        let mut reader = CbzReader::from_bytes_slice(&bytes).unwrap();
        assert_eq!(reader.len(), 3);

        let mut seen = Vec::new();
        reader
            .try_for_each(|file| {
                let mut file = file?;
                seen.push((file.name().to_string(), file.to_bytes()?.to_vec()));
                Ok::<_, Error>(())
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("001.jpg".to_string(), b"first".to_vec()),
                ("002.png".to_string(), b"second".to_vec()),
                ("extra/003.jpg".to_string(), b"nested".to_vec()),
            ]
        );
    }

    #[test]
    fn test_empty_filename_is_rejected() {
        let mut writer = CbzWriter::default();
        let res = writer.insert_from_bytes_slice_with_options("", b"x", FileOptions::default());
        assert!(matches!(res, Err(Error::CbzFileNameEmpty)));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_extract_to_keeps_relative_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        let bytes = sample_cbz();

        CbzReader::from_bytes_slice(&bytes)
            .unwrap()
            .extract_to(root.join("out"))
            .unwrap();

        assert_eq!(std::fs::read(root.join("out/001.jpg")).unwrap(), b"first");
        assert_eq!(std::fs::read(root.join("out/extra/003.jpg")).unwrap(), b"nested");
    }

    #[test]
    fn test_create_new_refuses_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("taken.cbz");
        std::fs::write(&path, b"already here").unwrap();

        assert!(matches!(CbzWriter::create_new(&path), Err(Error::IO(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"already here");
    }

    #[test]
    fn test_file_writer_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("page.jpg");
        std::fs::write(&source, b"page content").unwrap();
        let path = temp_dir.path().join("out.cbz");

        let mut writer = CbzWriter::create_new(&path).unwrap();
        assert_eq!(writer.insert_path("001.jpg", &source).unwrap(), 12);
        writer.finish().unwrap().sync().unwrap();

        let mut reader = CbzReader::from_path(&path).unwrap();
        assert_eq!(reader.file_names(), vec!["001.jpg"]);
        let mut file = reader.read_by_name("001.jpg").unwrap();
        assert!(!file.is_dir());
        assert_eq!(file.to_bytes().unwrap().as_ref(), b"page content");
    }
}
