// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Mapping of canonical fields to format-specific tag keys.

use super::Format;
use crate::record::CanonicalField;
use std::collections::BTreeMap;

/// Tag values keyed by the format-specific tag key.
pub type TagMapping = BTreeMap<&'static str, String>;

/// Get the tag key that stores `field` in files of the given format.
///
/// ID3v2 keys are frame IDs; `TXXX:<description>` denotes a user-defined text frame. MP4 keys
/// starting with `----:` are freeform atoms in the form `----:<mean>:<name>`.
#[must_use]
pub fn tag_key(format: Format, field: CanonicalField) -> &'static str {
    match format {
        Format::Mp3 | Format::Wav => match field {
            CanonicalField::Artist => "TPE1",
            CanonicalField::Title => "TIT2",
            CanonicalField::Year => "TDRC",
            CanonicalField::Genre => "TCON",
            CanonicalField::Style => "TXXX:STYLE",
            CanonicalField::Label => "TPUB",
        },
        Format::Flac | Format::Ogg => match field {
            CanonicalField::Artist => "ARTIST",
            CanonicalField::Title => "TITLE",
            CanonicalField::Year => "DATE",
            CanonicalField::Genre => "GENRE",
            CanonicalField::Style => "STYLE",
            CanonicalField::Label => "LABEL",
        },
        Format::Mp4 => match field {
            CanonicalField::Artist => "\u{a9}ART",
            CanonicalField::Title => "\u{a9}nam",
            CanonicalField::Year => "\u{a9}day",
            CanonicalField::Genre => "\u{a9}gen",
            CanonicalField::Style => "----:com.apple.iTunes:STYLE",
            CanonicalField::Label => "----:com.apple.iTunes:LABEL",
        },
        Format::Wma => match field {
            CanonicalField::Artist => "Author",
            CanonicalField::Title => "Title",
            CanonicalField::Year => "WM/Year",
            CanonicalField::Genre => "WM/Genre",
            CanonicalField::Style => "WM/Style",
            CanonicalField::Label => "WM/Publisher",
        },
    }
}

/// Map canonical field values to the tag keys of the given format.
///
/// Fields that are missing (or empty) are omitted from the result, so that no empty
/// placeholder values are ever written.
#[must_use]
pub fn map_fields(format: Format, fields: &BTreeMap<CanonicalField, String>) -> TagMapping {
    fields
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(&field, value)| (tag_key(format, field), value.clone()))
        .collect()
}
