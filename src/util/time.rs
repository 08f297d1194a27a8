// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Time-related utility functions.

use chrono::{
    format::{parse, Parsed, StrftimeItems},
    Datelike, Local, NaiveDate,
};

/// Allowed date formats (as returned by Discogs or specified in a filename).
const PARTIAL_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y-%m", "%Y%m%d", "%Y%m", "%Y"];

/// Earliest year that is considered plausible for a release.
const MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// Parse a date from a [`str`] slice by trying various common formats.
fn parse_partial_date_from_str(value: impl AsRef<str>) -> Option<NaiveDate> {
    for fmt in PARTIAL_DATE_FORMATS {
        let mut parsed = Parsed::new();
        if parse(&mut parsed, value.as_ref(), StrftimeItems::new(fmt)).is_err() {
            continue;
        }

        if let Some(date) = parsed
            .year()
            .map(|year| {
                parsed
                    .month()
                    .map_or((year, 1, 1), |month| (year, month, parsed.day().unwrap_or(1)))
            })
            .and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
        {
            return Some(date);
        }
    }

    None
}

/// The current year in local time.
#[must_use]
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Parse the year from a [`str`] slice and return it if it is plausible, i.e. a four-digit
/// year between 1900 and the year after `current_year`.
///
/// Discogs uses `0` or an empty string for unknown years, which are rejected.
pub fn parse_plausible_year(value: &str, current_year: i32) -> Option<u16> {
    let value = value.trim();
    if !value
        .get(..4)
        .is_some_and(|year| year.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }

    parse_partial_date_from_str(value)
        .map(|date| date.year())
        .filter(|year| (MIN_PLAUSIBLE_YEAR..=current_year + 1).contains(year))
        .and_then(|year| u16::try_from(year).ok())
}
