// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Caching for Discogs API queries.

use crate::discogs::{ReleaseDetails, SearchPage};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use xdg::BaseDirectories;

/// Cache for Discogs queries (to not use their API too much unnecessarily).
pub trait Cache {
    /// Get a search result page from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache miss occurred or the cache file could not be read or the
    /// deserialization failed.
    fn get_search_page(
        &self,
        artist: &str,
        title: &str,
        per_page: u32,
        page: u32,
    ) -> Result<SearchPage, CacheError>;

    /// Insert a search result page into the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file could not be written or the serialization failed.
    fn insert_search_page(
        &self,
        artist: &str,
        title: &str,
        per_page: u32,
        page: u32,
        result: &SearchPage,
    ) -> Result<(), CacheError>;

    /// Get the details of a release from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache miss occurred or the cache file could not be read or the
    /// deserialization failed.
    fn get_release(&self, release_id: u64) -> Result<ReleaseDetails, CacheError>;

    /// Insert the details of a release into the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file could not be written or the serialization failed.
    fn insert_release(&self, release_id: u64, release: &ReleaseDetails) -> Result<(), CacheError>;
}

/// Cache Error.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Item was not found in cache.
    #[error("Cache Miss")]
    CacheMiss,
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// JSON (De-)Serialization Error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Path under which the cached releases are stored.
const DISCOGS_RELEASE_PATH_PREFIX: &str = "discogs/release";

/// Path under which the cached search result pages are stored.
const DISCOGS_SEARCH_PATH_PREFIX: &str = "discogs/search";

/// Maximum age of a a cache entry after which it expires.
const MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Create the cache path for a Discogs release with the given ID.
fn discogs_release_path(release_id: u64) -> PathBuf {
    Path::new(DISCOGS_RELEASE_PATH_PREFIX).join(format!("{release_id}.json"))
}

/// Create the cache path for a Discogs search result page.
fn discogs_search_path(artist: &str, title: &str, per_page: u32, page: u32) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(artist.as_bytes());
    hasher.update([b'|']);
    hasher.update(title.as_bytes());
    hasher.update([b'|']);
    hasher.update(per_page.to_be_bytes());
    hasher.update([b'|']);
    hasher.update(page.to_be_bytes());
    let hash = hasher.finalize();
    Path::new(DISCOGS_SEARCH_PATH_PREFIX).join(format!("{hash:064x}.json"))
}

/// Convenience function to get a JSON-deserializable item with the given path from the cache.
fn get_from_cache<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, CacheError> {
    let cache_age = path
        .as_ref()
        .metadata()?
        .modified()
        .ok()
        .and_then(|time| time.elapsed().ok())
        .unwrap_or(Duration::MAX);
    if cache_age > MAX_AGE {
        log::debug!("Removing expired cache file {}", path.as_ref().display());
        std::fs::remove_file(path)?;
        return Err(CacheError::CacheMiss);
    }

    let f = File::open(path)?;
    let reader = BufReader::new(f);
    Ok(serde_json::from_reader(reader)?)
}

/// Convenience function to insert a JSON-deserializable item with the given path into cache.
fn insert_into_cache<T: Serialize, P: AsRef<Path>>(path: P, item: &T) -> Result<(), CacheError> {
    let f = File::create(path)?;
    let writer = BufWriter::new(f);
    Ok(serde_json::to_writer(writer, item)?)
}

impl Cache for BaseDirectories {
    fn get_search_page(
        &self,
        artist: &str,
        title: &str,
        per_page: u32,
        page: u32,
    ) -> Result<SearchPage, CacheError> {
        let path = self
            .find_cache_file(discogs_search_path(artist, title, per_page, page))
            .ok_or(CacheError::CacheMiss)?;
        get_from_cache(path)
    }

    fn insert_search_page(
        &self,
        artist: &str,
        title: &str,
        per_page: u32,
        page: u32,
        result: &SearchPage,
    ) -> Result<(), CacheError> {
        let path = self.place_cache_file(discogs_search_path(artist, title, per_page, page))?;
        insert_into_cache(path, result)
    }

    fn get_release(&self, release_id: u64) -> Result<ReleaseDetails, CacheError> {
        let path = self
            .find_cache_file(discogs_release_path(release_id))
            .ok_or(CacheError::CacheMiss)?;
        get_from_cache(path)
    }

    fn insert_release(&self, release_id: u64, release: &ReleaseDetails) -> Result<(), CacheError> {
        let path = self.place_cache_file(discogs_release_path(release_id))?;
        insert_into_cache(path, release)
    }
}
