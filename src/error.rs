// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Error and result types.

use crate::tag::Format;
use std::io;
use thiserror::Error;

/// Main error type.
#[derive(Error, Debug)]
pub enum ErrorType {
    /// Configuration error.
    #[error("Configuration Error ({0})")]
    Config(#[from] crate::config::ConfigError),
    /// The filename pattern is invalid.
    #[error("Invalid filename pattern: {0}")]
    Pattern(#[from] crate::pattern::PatternError),
    /// The filename does not match the pattern.
    #[error("Filename does not match pattern: {0}")]
    NoMatch(#[from] crate::pattern::NoMatch),
    /// A Discogs lookup failed.
    #[error("Discogs lookup failed: {0}")]
    Resolution(#[from] crate::resolver::ResolutionError),
    /// File has an unknown file extension.
    #[error("{0}")]
    UnsupportedFormat(#[from] crate::tag::UnsupportedFormatError),
    /// There is no tag writer for this format.
    #[error("Writing {0} tags is not supported")]
    NoTagWriter(Format),
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// JSON (De-)Serialization Error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Errors raised by the [`id3`] crate.
    #[cfg(feature = "id3")]
    #[error("Failed to write ID3 tag")]
    Id3(#[from] id3::Error),
    /// Errors raised by the [`metaflac`] crate.
    #[cfg(feature = "flac")]
    #[error("Failed to write FLAC tag")]
    Flac(#[from] metaflac::Error),
    /// Errors raised by the [`lofty`] crate.
    #[cfg(feature = "lofty")]
    #[error("Failed to write tag: {0}")]
    Lofty(#[from] lofty::error::LoftyError),
}

/// Convenience type.
pub type Result<T> = std::result::Result<T, ErrorType>;
