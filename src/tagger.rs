// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! The tagging pipeline: parse the filename, resolve the release, map and write the tags.

use crate::pattern::{Pattern, PatternError};
use crate::record::{CanonicalField, CanonicalRecord};
use crate::resolver::ReleaseLookup;
use crate::tag::{map_fields, write_tags, Format, TagMapping};
use crate::util::walk_dir;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Separator used to join multiple genres or styles if none is configured.
const DEFAULT_SEPARATOR: &str = "; ";

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Tags were written (or would have been written in a dry run).
    Tagged,
    /// The file was not processed, e.g. because its name does not match the pattern.
    Skipped,
    /// Writing the tags failed.
    Failed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tagged => "tagged",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        })
    }
}

/// The outcome of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Path of the file.
    pub path: PathBuf,
    /// What happened to the file.
    pub status: FileStatus,
    /// Human-readable description of the outcome.
    pub message: String,
    /// The Discogs lookup failed and only filename-derived tags were used.
    pub degraded: bool,
    /// The tags that were (or would have been) written.
    pub mapping: TagMapping,
}

impl FileOutcome {
    /// Outcome of a skipped file.
    fn skipped(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Skipped,
            message: message.into(),
            degraded: false,
            mapping: TagMapping::new(),
        }
    }
}

/// Summary of a tagging run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Outcomes of all processed files, in processing order.
    pub outcomes: Vec<FileOutcome>,
}

impl TagReport {
    /// Count the outcomes with the given status.
    fn count(&self, status: FileStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    /// Number of tagged files.
    #[must_use]
    pub fn tagged(&self) -> usize {
        self.count(FileStatus::Tagged)
    }

    /// Number of skipped files.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(FileStatus::Skipped)
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    /// Number of files that were tagged without Discogs data because the lookup failed.
    #[must_use]
    pub fn degraded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == FileStatus::Tagged && outcome.degraded)
            .count()
    }

    /// Whether any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl fmt::Display for TagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{tagged} tagged, {skipped} skipped, {failed} failed",
            tagged = self.tagged(),
            skipped = self.skipped(),
            failed = self.failed()
        )?;
        let degraded = self.degraded();
        if degraded > 0 {
            write!(f, " ({degraded} without Discogs data)")?;
        }
        Ok(())
    }
}

/// Collect the audio files to tag.
///
/// A file path yields itself. A directory yields the supported audio files it contains, sorted
/// by path, descending into subdirectories only if `recursive` is set.
///
/// # Errors
///
/// Returns an error if the path or one of the visited directories cannot be read.
pub fn collect_files(path: impl AsRef<Path>, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if !path.is_dir() {
        let _metadata = path.metadata()?;
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = vec![];
    for result in walk_dir(path.to_path_buf(), recursive) {
        let (_, _, dir_files) = result?;
        files.extend(
            dir_files
                .into_iter()
                .filter(|file| Format::from_path(file).is_ok()),
        );
    }
    files.sort();
    Ok(files)
}

/// Tags files based on their filenames and (optionally) a release lookup.
#[derive(Debug)]
pub struct Tagger<L> {
    /// Pattern that filename stems are parsed with.
    pattern: Pattern,
    /// Release lookup used to enrich the tags.
    lookup: Option<L>,
    /// Do not write any tags.
    dry_run: bool,
    /// Separator used to join multiple genres or styles.
    separator: String,
}

impl<L: ReleaseLookup> Tagger<L> {
    /// Create a new tagger.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MissingField`] if the pattern does not contain both the `artist`
    /// and the `title` field.
    pub fn new(pattern: Pattern, lookup: Option<L>) -> Result<Self, PatternError> {
        pattern.require_fields(&[
            CanonicalField::Artist.as_str(),
            CanonicalField::Title.as_str(),
        ])?;
        Ok(Self {
            pattern,
            lookup,
            dry_run: false,
            separator: DEFAULT_SEPARATOR.to_string(),
        })
    }

    /// Only show the tags that would be written.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the separator used to join multiple genres or styles.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Process a single file.
    ///
    /// Errors are not propagated, but recorded in the returned outcome.
    pub async fn tag_file(&self, path: &Path) -> FileOutcome {
        let format = match Format::from_path(path) {
            Ok(format) => format,
            Err(err) => return FileOutcome::skipped(path, err.to_string()),
        };

        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            return FileOutcome::skipped(path, "Filename is not valid UTF-8");
        };

        let parsed = match self.pattern.parse(stem) {
            Ok(parsed) => parsed,
            Err(err) => {
                return FileOutcome::skipped(
                    path,
                    format!("Filename does not match pattern '{}': {err}", self.pattern),
                )
            }
        };

        let mut record = match CanonicalRecord::from_parsed_fields(path, format, &parsed) {
            Ok(record) => record,
            Err(err) => return FileOutcome::skipped(path, err.to_string()),
        };

        let mut degraded = false;
        let mut message = String::from("Tagged from filename");
        if let Some(lookup) = &self.lookup {
            let result = lookup.resolve(record.artist(), record.title()).await;
            match result {
                Ok(Some(release)) => {
                    log::debug!(
                        "Resolved {} - {} to {}",
                        record.artist(),
                        record.title(),
                        release.release_url()
                    );
                    record.merge_release(&release, &self.separator);
                    message = format!(
                        "Tagged from filename and Discogs release {} ({} - {})",
                        release.release_id, release.artist, release.title
                    );
                }
                Ok(None) => {
                    message = String::from("Tagged from filename (no Discogs release found)");
                }
                Err(err) => {
                    log::warn!(
                        "Discogs lookup for {} failed, using filename only: {err}",
                        path.display()
                    );
                    degraded = true;
                    message = format!("Tagged from filename (Discogs lookup failed: {err})");
                }
            }
        }

        let mapping = map_fields(format, record.fields());
        if self.dry_run {
            message = format!("{message} [dry run]");
        } else if let Err(err) = write_tags(path, format, &mapping) {
            return FileOutcome {
                path: path.to_path_buf(),
                status: FileStatus::Failed,
                message: err.to_string(),
                degraded,
                mapping,
            };
        }

        FileOutcome {
            path: path.to_path_buf(),
            status: FileStatus::Tagged,
            message,
            degraded,
            mapping,
        }
    }

    /// Process the files one after another.
    pub async fn run(&self, paths: &[PathBuf]) -> TagReport {
        let mut report = TagReport::default();
        for path in paths {
            let outcome = self.tag_file(path).await;
            match outcome.status {
                FileStatus::Tagged => log::info!("{}: {}", path.display(), outcome.message),
                FileStatus::Skipped => log::warn!("{}: {}", path.display(), outcome.message),
                FileStatus::Failed => log::error!("{}: {}", path.display(), outcome.message),
            }
            let level = if self.dry_run {
                log::Level::Info
            } else {
                log::Level::Debug
            };
            for (key, value) in &outcome.mapping {
                log::log!(level, "  {key} = {value:?}");
            }
            report.outcomes.push(outcome);
        }
        report
    }
}
