// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `lookup` CLI subcommand.

use crate::{Config, DiscogsClient, ReleaseLookup, ReleaseResolver, ResolvedRelease};
use clap::Parser;
use itertools::Itertools;
use serde::Serialize;
use std::process::ExitCode;

/// Placeholder for values that Discogs does not provide.
const NOT_AVAILABLE: &str = "N/A";

/// Command line arguments for the `lookup` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Track artist.
    artist: String,
    /// Track title.
    title: String,
    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
    /// Do not check the tracklist of candidate releases.
    #[arg(long)]
    no_verify: bool,
    /// Discogs personal access token.
    #[arg(long)]
    discogs_token: Option<String>,
}

/// JSON representation of a resolved release.
#[derive(Serialize, Debug)]
struct ReleaseJson<'a> {
    /// The resolved release.
    #[serde(flatten)]
    release: &'a ResolvedRelease,
    /// URL of the release page on the Discogs website.
    release_url: String,
}

impl<'a> From<&'a ResolvedRelease> for ReleaseJson<'a> {
    fn from(release: &'a ResolvedRelease) -> Self {
        Self {
            release,
            release_url: release.release_url(),
        }
    }
}

/// Join the values, or return `N/A` if there are none.
fn join_or_not_available(values: &[String], separator: &str) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.iter().join(separator)
    }
}

/// Format a resolved release in a human-readable way.
fn format_release(release: &ResolvedRelease, separator: &str) -> String {
    let not_available = || NOT_AVAILABLE.to_string();
    [
        format!("Artist:  {}", release.artist),
        format!("Title:   {}", release.title),
        format!(
            "Year:    {}",
            release.year.map_or_else(not_available, |year| year.to_string())
        ),
        format!("Genre:   {}", join_or_not_available(&release.genres, separator)),
        format!("Style:   {}", join_or_not_available(&release.styles, separator)),
        format!("Label:   {}", release.label.clone().unwrap_or_else(not_available)),
        format!("Format:  {}", release.format.clone().unwrap_or_else(not_available)),
        format!("Country: {}", release.country.clone().unwrap_or_else(not_available)),
        format!("Discogs: {}", release.release_url()),
    ]
    .join("\n")
}

/// Run the `lookup` command.
///
/// # Errors
///
/// Returns an error if the Discogs lookup fails.
pub async fn run(config: &Config, args: Args) -> crate::Result<ExitCode> {
    let mut discogs_config = config.discogs.clone();
    if let Some(token) = args.discogs_token {
        discogs_config.token = Some(token);
    }
    if args.no_verify {
        discogs_config.verify_tracklist = false;
    }

    let resolver = ReleaseResolver::new(DiscogsClient::new(&discogs_config)?);
    let release = resolver.resolve(&args.artist, &args.title).await?;

    if args.json {
        let json = release.as_ref().map(ReleaseJson::from);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if let Some(release) = &release {
        println!(
            "{}",
            format_release(release, &config.tagging.multi_value_separator)
        );
    } else {
        println!("No release found for {} - {}", args.artist, args.title);
    }

    Ok(if release.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
