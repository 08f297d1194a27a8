// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for Ogg Vorbis comments and MP4 atoms via [`lofty`].

use crate::tag::Tag;
use lofty::{ItemKey, ItemValue, Probe, TagExt, TagItem, TaggedFileExt};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tag of an Ogg or MP4 file.
pub struct LoftyTag {
    /// Path of the file the tag was read from.
    path: PathBuf,
    /// The underlying tag data.
    data: lofty::Tag,
}

impl fmt::Debug for LoftyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoftyTag")
            .field("path", &self.path)
            .field("tag_type", &self.data.tag_type())
            .field("item_count", &self.data.item_count())
            .finish()
    }
}

impl LoftyTag {
    #[cfg(test)]
    pub fn new(format: crate::tag::Format) -> Self {
        use crate::tag::Format;
        use lofty::TagType;

        let tag_type = match format {
            Format::Mp4 => TagType::Mp4Ilst,
            _ => TagType::VorbisComments,
        };
        LoftyTag {
            path: PathBuf::new(),
            data: lofty::Tag::new(tag_type),
        }
    }

    /// Read the primary tag from the path. Files without one get a new, empty tag.
    pub fn read_from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let tagged_file = Probe::open(path)?.read()?;
        let tag_type = tagged_file.primary_tag_type();
        let data = tagged_file.tag(tag_type).cloned().unwrap_or_else(|| {
            log::debug!("No {tag_type:?} tag found in {}, creating new one", path.display());
            lofty::Tag::new(tag_type)
        });

        Ok(LoftyTag {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Get the item key for a Vorbis comment field name or an MP4 atom identifier.
    ///
    /// Keys that `lofty` has no generic counterpart for (e.g. `STYLE`) are kept verbatim.
    fn item_key(key: &str) -> ItemKey {
        match key {
            "ARTIST" | "\u{a9}ART" => ItemKey::TrackArtist,
            "TITLE" | "\u{a9}nam" => ItemKey::TrackTitle,
            "DATE" | "\u{a9}day" => ItemKey::RecordingDate,
            "GENRE" | "\u{a9}gen" => ItemKey::Genre,
            "LABEL" | "----:com.apple.iTunes:LABEL" => ItemKey::Label,
            key => ItemKey::Unknown(key.to_string()),
        }
    }
}

impl Tag for LoftyTag {
    fn get(&self, key: &str) -> Option<&str> {
        self.data.get_string(&Self::item_key(key))
    }

    fn set(&mut self, key: &str, value: &str) {
        let item_key = Self::item_key(key);
        self.data.remove_key(&item_key);
        self.data.insert_unchecked(TagItem::new(
            item_key,
            ItemValue::Text(value.to_string()),
        ));
    }

    fn write(&mut self) -> crate::Result<()> {
        self.data.save_to_path(&self.path)?;
        log::debug!("Wrote {:?} tag to {}", self.data.tag_type(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CanonicalField;
    use crate::tag::{tag_key, Format};
    use paste::paste;

    macro_rules! add_test_get_and_set {
        ($format:expr, $field:expr, $fnsuffix:ident) => {
            paste! {
                #[test]
                fn [<test_get_and_set_ $fnsuffix>]() {
                    let key = tag_key($format, $field);
                    let mut tag = LoftyTag::new($format);
                    assert!(tag.get(key).is_none());

                    tag.set(key, "Example Value");
                    assert_eq!(tag.get(key), Some("Example Value"));

                    tag.set(key, "Other Value");
                    assert_eq!(tag.get(key), Some("Other Value"));
                }
            }
        };
    }

    add_test_get_and_set!(Format::Ogg, CanonicalField::Artist, ogg_artist);
    add_test_get_and_set!(Format::Ogg, CanonicalField::Title, ogg_title);
    add_test_get_and_set!(Format::Ogg, CanonicalField::Year, ogg_year);
    add_test_get_and_set!(Format::Ogg, CanonicalField::Genre, ogg_genre);
    add_test_get_and_set!(Format::Ogg, CanonicalField::Style, ogg_style);
    add_test_get_and_set!(Format::Ogg, CanonicalField::Label, ogg_label);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Artist, mp4_artist);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Title, mp4_title);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Year, mp4_year);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Genre, mp4_genre);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Style, mp4_style);
    add_test_get_and_set!(Format::Mp4, CanonicalField::Label, mp4_label);

    #[test]
    fn test_item_key() {
        assert_eq!(LoftyTag::item_key("ARTIST"), ItemKey::TrackArtist);
        assert_eq!(LoftyTag::item_key("\u{a9}nam"), ItemKey::TrackTitle);
        assert_eq!(
            LoftyTag::item_key("STYLE"),
            ItemKey::Unknown("STYLE".to_string())
        );
    }

    #[test]
    fn test_set_replaces_existing_item() {
        let mut tag = LoftyTag::new(Format::Ogg);
        tag.set("GENRE", "Rock");
        tag.set("GENRE", "Electronic");
        assert_eq!(tag.data.get_items(&ItemKey::Genre).count(), 1);
    }

    #[test]
    fn test_read_from_invalid_file() {
        let file = tempfile::Builder::new().suffix(".ogg").tempfile().unwrap();
        std::fs::write(file.path(), b"not an ogg file").unwrap();
        assert!(LoftyTag::read_from_path(file.path()).is_err());
    }

    #[test]
    fn test_debug_shows_tag_summary() {
        let mut tag = LoftyTag::new(Format::Mp4);
        tag.set("\u{a9}ART", "Pink Floyd");
        let debug = format!("{tag:?}");
        assert!(debug.contains("Mp4Ilst"));
        assert!(debug.contains("item_count: 1"));
    }
}
