// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Normalization of artist names and titles for comparison.

use regex::Regex;
use std::sync::LazyLock;
use unidecode::unidecode;

/// Common suffixes that are stripped and added as a prefix during [`normalize`].
const SUFFIXES: [&str; 3] = [", the", ", a", ", an"];

/// Discogs disambiguates artists with the same name by appending a number (e.g. `Nirvana (2)`)
/// and marks artist name variations with a trailing asterisk.
static DISCOGS_ARTIST_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:\s*\(\d+\))?\s*\*?\s*$").ok());

/// Normalize a string slice value for comparison.
///
/// The value is transliterated to lowercase ASCII, Discogs artist suffixes are removed, common
/// suffixes like `, The` are moved to the front, `&` is replaced by `and`, punctuation is
/// removed and whitespace is collapsed.
#[must_use]
pub fn normalize(value: &str) -> String {
    // Normalize all strings to ASCII lowercase.
    let mut value = unidecode(value);
    value.make_ascii_lowercase();

    if let Some(re) = DISCOGS_ARTIST_SUFFIX.as_ref() {
        value = re.replace(&value, "").into_owned();
    }

    // Move common suffixes (e.g., ", the") to the front of the string.
    for suffix in SUFFIXES {
        if let Some(stripped) = value.strip_suffix(suffix) {
            let new_prefix = suffix.trim_start_matches(", ");
            value = format!("{new_prefix} {stripped}");
            break;
        }
    }

    value
        .replace('&', " and ")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
