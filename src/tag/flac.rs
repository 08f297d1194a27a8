// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for FLAC tags.

use crate::tag::Tag;
use std::fmt;
use std::path::Path;

/// FLAC tag (Vorbis comments).
pub struct FlacTag {
    /// The underlying tag data.
    data: metaflac::Tag,
}

impl fmt::Debug for FlacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlacTag")
            .field(
                "vorbis_comments",
                &self.data.vorbis_comments().map(|comments| &comments.comments),
            )
            .finish_non_exhaustive()
    }
}

impl FlacTag {
    #[cfg(test)]
    pub fn new() -> Self {
        FlacTag {
            data: metaflac::Tag::new(),
        }
    }

    /// Read the FLAC tag from the path.
    pub fn read_from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let data = metaflac::Tag::read_from_path(path)?;
        Ok(FlacTag { data })
    }
}

impl Tag for FlacTag {
    fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get_vorbis(key)
            .and_then(|mut iterator| iterator.next())
    }

    fn set(&mut self, key: &str, value: &str) {
        self.data.set_vorbis(key, vec![value]);
    }

    fn write(&mut self) -> crate::Result<()> {
        self.data.save()?;
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
        ($field:expr, $fnsuffix:ident) => {
            paste! {
                #[test]
                fn [<test_get_and_set_ $fnsuffix>]() {
                    let key = tag_key(Format::Flac, $field);
                    let mut tag = FlacTag::new();
                    assert!(tag.get(key).is_none());

                    tag.set(key, "Example Value");
                    assert_eq!(tag.get(key), Some("Example Value"));

                    tag.set(key, "Other Value");
                    assert_eq!(tag.get(key), Some("Other Value"));
                }
            }
        };
    }

    add_test_get_and_set!(CanonicalField::Artist, artist);
    add_test_get_and_set!(CanonicalField::Title, title);
    add_test_get_and_set!(CanonicalField::Year, year);
    add_test_get_and_set!(CanonicalField::Genre, genre);
    add_test_get_and_set!(CanonicalField::Style, style);
    add_test_get_and_set!(CanonicalField::Label, label);

    #[test]
    fn test_set_replaces_all_values() {
        let mut tag = FlacTag::new();
        tag.data
            .set_vorbis("GENRE", vec!["Rock".to_string(), "Pop".to_string()]);
        tag.set("GENRE", "Electronic");
        assert_eq!(
            tag.data.get_vorbis("GENRE").map(Iterator::count),
            Some(1)
        );
        assert_eq!(tag.get("GENRE"), Some("Electronic"));
    }

    #[test]
    fn test_read_from_invalid_file() {
        let file = tempfile::Builder::new().suffix(".flac").tempfile().unwrap();
        std::fs::write(file.path(), b"not a flac file").unwrap();
        assert!(matches!(
            FlacTag::read_from_path(file.path()),
            Err(crate::Error::Flac(_))
        ));
    }
}
