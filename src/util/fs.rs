// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Filesystem-related utility functions.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// An iterator that recursively walks through a directory structure and yields a tuple `(path,
/// dirs, files)` for each directory it visits.
///
/// Directories are visited in lexicographical order of their paths, so that the files of all
/// visited directories are yielded in a stable, sorted order.
///
/// This struct is created by [`walk_dir`]. See its documentation for more.
#[derive(Debug)]
pub struct DirWalk {
    /// Queued paths that will be visited next.
    queue: BinaryHeap<Reverse<PathBuf>>,
    /// Whether subdirectories are visited.
    recursive: bool,
}

impl Iterator for DirWalk {
    type Item = io::Result<(PathBuf, Vec<PathBuf>, Vec<PathBuf>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(path) = self.queue.pop()?;
        log::debug!("Visiting directory: {}", path.display());
        Some(fs::read_dir(&path).and_then(|entries| {
            let mut files = vec![];
            let mut dirs = vec![];
            for entry in entries {
                let entry_path = entry?.path();

                if entry_path.is_dir() {
                    dirs.push(entry_path);
                } else {
                    files.push(entry_path);
                }
            }

            dirs.sort_unstable();
            files.sort_unstable();

            if self.recursive {
                self.queue.extend(dirs.iter().cloned().map(Reverse));
            }

            Ok((path, dirs, files))
        }))
    }
}

/// Creates an iterator that walks through a directory structure and yields a tuple consisting
/// of the path of current directory and the files and directories in that directory.
///
/// Subdirectories are only descended into if `recursive` is set.
pub fn walk_dir(path: PathBuf, recursive: bool) -> DirWalk {
    let mut queue = BinaryHeap::new();
    queue.push(Reverse(path));
    DirWalk { queue, recursive }
}
