// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Tag audio files with metadata derived from their filenames and [Discogs][discogs].
//!
//! [discogs]: https://www.discogs.com

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::missing_docs_in_private_items)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(elided_lifetimes_in_paths)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(let_underscore_drop)]
#![deny(macro_use_extern_crate)]
#![deny(meta_variable_misuse)]
#![deny(missing_abi)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(non_ascii_idents)]
#![deny(noop_method_call)]
#![deny(rust_2021_incompatible_closure_captures)]
#![deny(rust_2021_incompatible_or_patterns)]
#![deny(rust_2021_prefixes_incompatible_syntax)]
#![deny(rust_2021_prelude_collisions)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unstable_features)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_lifetimes)]
#![deny(unused_macro_rules)]

mod cache;
pub mod cli;
mod config;
mod discogs;
mod error;
mod pattern;
mod record;
mod resolver;
mod tag;
mod tagger;
mod util;

pub use cache::{Cache, CacheError};
pub use config::{Config, ConfigError, DiscogsConfig, PatternConfig, TaggingConfig};
pub use discogs::{DiscogsCandidate, DiscogsClient, ReleaseDetails, SearchPage};
pub use error::{ErrorType as Error, Result};
pub use pattern::{NoMatch, ParsedFields, Pattern, PatternError, Token};
pub use record::{CanonicalField, CanonicalRecord};
pub use resolver::{
    select_release, ReleaseLookup, ReleaseResolver, ResolutionError, ResolvedRelease,
};
pub use tag::{map_fields, tag_key, write_tags, Format, TagMapping, UnsupportedFormatError};
pub use tagger::{collect_files, FileOutcome, FileStatus, TagReport, Tagger};
