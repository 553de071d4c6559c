//! File name classification and number extraction.
//!
//! Volume archives are detected with a loose, case-insensitive pattern
//! (`vol`, `v`, `vo` or `volume` followed by digits) while the volume number
//! itself is read from the stricter, case-sensitive `v<1-3 digits>` token.
//! A name can therefore be detected as a volume and still fail extraction.

use std::fmt::{self, Display};

use camino::Utf8Path;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Error, Result};

static VOLUME_ARCHIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(vol|v|vo|volume)\d+.*\.cbz$").expect("valid regex"));
static ARCHIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^.+\.cbz$").expect("valid regex"));
static CHAPTER_FOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Vol\. [1-9][0-9]* Ch\. [1-9][0-9]*$").expect("valid regex")
});
static PAGE_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.+\.(jpeg|jpg|png)$").expect("valid regex"));
static VOLUME_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v([0-9]{1,3})").expect("valid regex"));
static CHAPTER_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"c([0-9]{3})").expect("valid regex"));
static PAGE_RANGE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"p[0-9]{3}-p[0-9]{3}").expect("valid regex"));
static PAGE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"p[0-9]{3}").expect("valid regex"));
static LOOSE_CHAPTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[1-9][0-9]*").expect("valid regex"));

#[must_use]
pub fn is_volume_archive(name: &str) -> bool {
    VOLUME_ARCHIVE_RE.is_match(name)
}

#[must_use]
pub fn is_archive(name: &str) -> bool {
    ARCHIVE_RE.is_match(name)
}

#[must_use]
pub fn is_chapter_folder(name: &str) -> bool {
    CHAPTER_FOLDER_RE.is_match(name)
}

#[must_use]
pub fn is_page_image(name: &str) -> bool {
    PAGE_IMAGE_RE.is_match(name)
}

/// Reads the volume number from the file name component of `path`
///
/// ## Errors
///
/// Fails with `Error::VolumeNumber` when the name holds no `v` directly followed by digits,
/// or when these digits read as zero
pub fn extract_volume_number(path: impl AsRef<Utf8Path>) -> Result<u32> {
    let path = path.as_ref();
    let name = path.file_name().unwrap_or(path.as_str());

    VOLUME_NUMBER_RE
        .captures(name)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .filter(|number| *number > 0)
        .ok_or_else(|| Error::VolumeNumber(name.to_string()))
}

/// Reads the chapter number from a `c<3 digits>` token
///
/// ## Errors
///
/// Fails with `Error::ChapterToken` when no such token exists or when it reads as zero
pub fn extract_chapter_token(file_name: &str) -> Result<u32> {
    CHAPTER_TOKEN_RE
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .filter(|number| *number > 0)
        .ok_or_else(|| Error::ChapterToken(file_name.to_string()))
}

/// Page number (or range of pages) of an extracted image, along with its original extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken {
    /// `nnn` or `nnn-nnn`
    pub range: String,
    /// Extension including its leading dot, case preserved
    pub extension: String,
}

impl PageToken {
    /// Canonical name of the page once moved into its chapter folder
    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.range, self.extension)
    }
}

/// Reads the page token of `file_name`, page ranges (`p001-p002`) take precedence over single pages
///
/// ## Errors
///
/// Fails with `Error::PageToken` if neither form is present
pub fn extract_page_token(file_name: &str) -> Result<PageToken> {
    let Some(token) = PAGE_RANGE_TOKEN_RE
        .find(file_name)
        .or_else(|| PAGE_TOKEN_RE.find(file_name))
    else {
        return Err(Error::PageToken(file_name.to_string()));
    };

    let extension = Utf8Path::new(file_name)
        .extension()
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default();

    Ok(PageToken {
        range: token.as_str().replace('p', ""),
        extension,
    })
}

/// First number without leading zeros found anywhere in `file_name`.
/// `None` means the file can't be renamed and should be skipped.
#[must_use]
pub fn extract_loose_chapter_number(file_name: &str) -> Option<u32> {
    LOOSE_CHAPTER_RE
        .find(file_name)
        .and_then(|digits| digits.as_str().parse().ok())
}

#[must_use]
pub fn chapter_folder_name(volume: u32, chapter: u32) -> String {
    format!("Vol. {volume} Ch. {chapter}")
}

#[must_use]
pub fn loose_chapter_archive_name(chapter: u32) -> String {
    format!("Ch. {chapter}.cbz")
}
