// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The [`CanonicalRecord`] holds all known metadata of a single audio file.

use crate::pattern::{ParsedFields, PatternError};
use crate::resolver::ResolvedRelease;
use crate::tag::Format;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A canonical field describes a piece of metadata independent of any tag format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    /// Track artist.
    Artist,
    /// Track title.
    Title,
    /// Year of the original release.
    Year,
    /// Genre(s).
    Genre,
    /// Style(s), i.e. the more specific sub-genres used by Discogs.
    Style,
    /// Record label.
    Label,
}

impl CanonicalField {
    /// All canonical fields.
    pub const ALL: [CanonicalField; 6] = [
        Self::Artist,
        Self::Title,
        Self::Year,
        Self::Genre,
        Self::Style,
        Self::Label,
    ];

    /// Name of the field as used in filename patterns.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Title => "title",
            Self::Year => "year",
            Self::Genre => "genre",
            Self::Style => "style",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Metadata of one audio file, merged from its filename and (optionally) a Discogs release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// Path of the audio file.
    path: PathBuf,
    /// Container format of the file.
    format: Format,
    /// Known field values. Values are never empty.
    fields: BTreeMap<CanonicalField, String>,
}

impl CanonicalRecord {
    /// Create a record from the fields parsed from the filename.
    ///
    /// Fields that are not canonical (e.g. `{track}`) are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MissingField`] if the artist or title was not parsed.
    pub fn from_parsed_fields(
        path: impl Into<PathBuf>,
        format: Format,
        parsed: &ParsedFields,
    ) -> Result<Self, PatternError> {
        let mut record = Self {
            path: path.into(),
            format,
            fields: BTreeMap::new(),
        };

        for (name, value) in parsed.iter() {
            if let Ok(field) = name.parse::<CanonicalField>() {
                record.set(field, value);
            } else {
                log::debug!("Ignoring non-canonical field '{name}' with value {value:?}");
            }
        }

        for required in [CanonicalField::Artist, CanonicalField::Title] {
            if record.get(required).is_none() {
                return Err(PatternError::MissingField(required.to_string()));
            }
        }

        Ok(record)
    }

    /// Path of the audio file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container format of the audio file.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The track artist.
    #[must_use]
    pub fn artist(&self) -> &str {
        self.get(CanonicalField::Artist).unwrap_or_default()
    }

    /// The track title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.get(CanonicalField::Title).unwrap_or_default()
    }

    /// Get the value of a field.
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Set the value of a field. Empty values remove the field instead.
    pub fn set(&mut self, field: CanonicalField, value: impl AsRef<str>) {
        let value = value.as_ref().trim();
        if value.is_empty() {
            let _removed = self.fields.remove(&field);
        } else {
            let _previous = self.fields.insert(field, value.to_string());
        }
    }

    /// All known fields.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<CanonicalField, String> {
        &self.fields
    }

    /// Fill in fields from a resolved release.
    ///
    /// Fields that already have a value (e.g. a `{year}` from the filename) are kept. Genre and
    /// style are independent fields; list values are joined with `separator`.
    pub fn merge_release(&mut self, release: &ResolvedRelease, separator: &str) {
        let values = [
            (CanonicalField::Year, release.year.map(|year| year.to_string())),
            (
                CanonicalField::Genre,
                Some(release.genres.iter().join(separator)),
            ),
            (
                CanonicalField::Style,
                Some(release.styles.iter().join(separator)),
            ),
            (CanonicalField::Label, release.label.clone()),
        ];

        for (field, value) in values {
            let Some(value) = value else {
                continue;
            };

            if self.get(field).is_some() {
                log::debug!(
                    "Keeping {field} {:?} from filename instead of {value:?}",
                    self.get(field).unwrap_or_default()
                );
                continue;
            }

            self.set(field, value);
        }
    }
}
