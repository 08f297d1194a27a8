// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Tags and tag-related functions.

#[cfg(feature = "flac")]
mod flac;
#[cfg(feature = "id3")]
mod id3;
#[cfg(feature = "lofty")]
mod lofty;
mod schema;

pub use schema::{map_fields, tag_key, TagMapping};

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Encountered when a file's container format is not known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported format: {extension:?}")]
pub struct UnsupportedFormatError {
    /// The file extension (or format name) that was not recognized.
    pub extension: String,
}

/// The container format of an audio file, which determines how tags are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// MPEG Layer 3 with an ID3v2 tag.
    Mp3,
    /// FLAC with Vorbis comments.
    Flac,
    /// Ogg Vorbis with Vorbis comments.
    Ogg,
    /// MPEG-4 audio with iTunes-style atoms.
    Mp4,
    /// Windows Media Audio with ASF attributes.
    Wma,
    /// RIFF WAVE with an ID3v2 chunk.
    Wav,
}

impl Format {
    /// All supported formats.
    pub const ALL: [Format; 6] = [
        Self::Mp3,
        Self::Flac,
        Self::Ogg,
        Self::Mp4,
        Self::Wma,
        Self::Wav,
    ];

    /// File extensions (lowercase, without dot) that identify this format.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Mp3 => &["mp3"],
            Self::Flac => &["flac"],
            Self::Ogg => &["ogg"],
            Self::Mp4 => &["m4a", "mp4"],
            Self::Wma => &["wma"],
            Self::Wav => &["wav"],
        }
    }

    /// Detect the format from a file extension (case-insensitive, without dot).
    ///
    /// # Errors
    ///
    /// Returns an [`UnsupportedFormatError`] if the extension is unknown.
    pub fn from_extension(extension: &str) -> Result<Self, UnsupportedFormatError> {
        let extension = extension.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&extension.as_str()))
            .ok_or(UnsupportedFormatError { extension })
    }

    /// Detect the format from the extension of the given path.
    ///
    /// # Errors
    ///
    /// Returns an [`UnsupportedFormatError`] if the path has no or an unknown extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UnsupportedFormatError> {
        path.as_ref()
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| UnsupportedFormatError {
                extension: String::new(),
            })
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mp3 => "MP3",
            Self::Flac => "FLAC",
            Self::Ogg => "OGG",
            Self::Mp4 => "MP4",
            Self::Wma => "WMA",
            Self::Wav => "WAV",
        })
    }
}

impl FromStr for Format {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.to_string().eq_ignore_ascii_case(s))
            .map_or_else(|| Self::from_extension(s), Ok)
    }
}

/// A tag that has been read from a file and can be modified and written back.
pub trait Tag {
    /// Get the string value for the format-specific tag key.
    fn get(&self, key: &str) -> Option<&str>;
    /// Set the value for the format-specific tag key, replacing existing values.
    fn set(&mut self, key: &str, value: &str);
    /// Write the tag back to the file it was read from.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying tag library fails to write the file.
    fn write(&mut self) -> crate::Result<()>;
}

/// Read the tag from the file at `path`, or create an empty one if the file has none.
fn read_tag(path: &Path, format: Format) -> crate::Result<Box<dyn Tag>> {
    match format {
        #[cfg(feature = "id3")]
        Format::Mp3 | Format::Wav => self::id3::ID3v2Tag::read_from_path(path, format)
            .map(|tag| -> Box<dyn Tag> { Box::new(tag) }),
        #[cfg(feature = "flac")]
        Format::Flac => self::flac::FlacTag::read_from_path(path)
            .map(|tag| -> Box<dyn Tag> { Box::new(tag) }),
        #[cfg(feature = "lofty")]
        Format::Ogg | Format::Mp4 => self::lofty::LoftyTag::read_from_path(path)
            .map(|tag| -> Box<dyn Tag> { Box::new(tag) }),
        format => {
            log::debug!("No tag writer for {format} files");
            Err(crate::Error::NoTagWriter(format))
        }
    }
}

/// Write the mapped tag values into the file's tag container.
///
/// Existing tags that are not part of `mapping` are preserved. If the file has no tag yet, a
/// new one is created.
///
/// # Errors
///
/// Returns an error if the tag cannot be read or written, or if there is no writer for the
/// format.
pub fn write_tags(path: impl AsRef<Path>, format: Format, mapping: &TagMapping) -> crate::Result<()> {
    let path = path.as_ref();
    let mut tag = read_tag(path, format)?;
    for (key, value) in mapping {
        log::debug!("Setting {key} = {value:?} in {}", path.display());
        tag.set(key, value);
    }
    tag.write()
}
