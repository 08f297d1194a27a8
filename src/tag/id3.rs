// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for ID3 tags (in MP3 and WAV files).

use crate::tag::{Format, Tag};
use id3::{frame::ExtendedText, ErrorKind, TagLike, Version};
use std::path::{Path, PathBuf};

/// ID3 frame ID.
#[derive(Debug, PartialEq, Eq)]
enum FrameId<'a> {
    /// Text frame.
    Text(&'a str),
    /// Extended Text frame (`TXXX`).
    ExtendedText(&'a str),
}

impl<'a> FrameId<'a> {
    /// Parse a tag key (e.g. `TIT2` or `TXXX:STYLE`).
    fn from_key(key: &'a str) -> Self {
        key.strip_prefix("TXXX:")
            .map_or(FrameId::Text(key), FrameId::ExtendedText)
    }
}

/// ID3 tag (version 2).
#[derive(Debug)]
pub struct ID3v2Tag {
    /// Path of the file the tag was read from.
    path: PathBuf,
    /// Format of the file (MP3 or WAV).
    format: Format,
    /// The underlying tag data.
    data: id3::Tag,
}

impl ID3v2Tag {
    #[cfg(test)]
    pub fn new() -> Self {
        ID3v2Tag {
            path: PathBuf::new(),
            format: Format::Mp3,
            data: id3::Tag::with_version(Version::Id3v24),
        }
    }

    /// Read the ID3 tag from the path. Files without a tag get a new ID3v2.4 tag.
    pub fn read_from_path(path: impl AsRef<Path>, format: Format) -> crate::Result<Self> {
        let path = path.as_ref();
        #[allow(deprecated)]
        let result = match format {
            Format::Wav => id3::Tag::read_from_wav_path(path),
            _ => id3::Tag::read_from_path(path),
        };
        let data = match result {
            Ok(data) => data,
            Err(id3::Error {
                kind: ErrorKind::NoTag,
                ..
            }) => {
                log::debug!("No ID3 tag found in {}, creating new one", path.display());
                id3::Tag::with_version(Version::Id3v24)
            }
            Err(err) => return Err(err.into()),
        };

        Ok(ID3v2Tag {
            path: path.to_path_buf(),
            format,
            data,
        })
    }

    /// Get the content of an extended text frame as string.
    fn get_extended_text(&self, description: &str) -> Option<&str> {
        self.data
            .extended_texts()
            .find(|extended_text| extended_text.description == description)
            .map(|extended_text| extended_text.value.as_str())
    }
}

impl Tag for ID3v2Tag {
    fn get(&self, key: &str) -> Option<&str> {
        match FrameId::from_key(key) {
            FrameId::Text(id) => self.data.get(id).and_then(|frame| frame.content().text()),
            FrameId::ExtendedText(description) => self.get_extended_text(description),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match FrameId::from_key(key) {
            FrameId::Text(id) => {
                self.data.set_text(id, value);
            }
            FrameId::ExtendedText(description) => {
                self.data.remove_extended_text(Some(description), None);
                let _previous = self.data.add_frame(ExtendedText {
                    description: description.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    fn write(&mut self) -> crate::Result<()> {
        let version = self.data.version();
        #[allow(deprecated)]
        match self.format {
            Format::Wav => self.data.write_to_wav_path(&self.path, version)?,
            _ => self.data.write_to_path(&self.path, version)?,
        }
        log::debug!("Wrote ID3 tag to {}", self.path.display());
        Ok(())
    }
}
