// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Module for the `tag` CLI subcommand.

use crate::{collect_files, Config, DiscogsClient, Pattern, ReleaseResolver, Tagger};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line arguments for the `tag` CLI command.
#[derive(Parser, Debug)]
pub struct Args {
    /// Audio file or directory to tag.
    path: PathBuf,
    /// Filename pattern, e.g. "{artist} - {title}".
    #[arg(short, long)]
    pattern: Option<String>,
    /// Look up year, genre, style and label on Discogs.
    #[arg(long)]
    discogs: bool,
    /// Discogs personal access token.
    #[arg(long)]
    discogs_token: Option<String>,
    /// Do not check the tracklist of candidate releases.
    #[arg(long)]
    no_verify: bool,
    /// Show the tags that would be written without modifying any files.
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Descend into subdirectories.
    #[arg(short, long)]
    recursive: bool,
}

impl Args {
    /// Apply the command line flags on top of the loaded configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(template) = &self.pattern {
            config.pattern.template.clone_from(template);
        }
        if self.discogs {
            config.discogs.enabled = true;
        }
        if let Some(token) = &self.discogs_token {
            config.discogs.token = Some(token.clone());
        }
        if self.no_verify {
            config.discogs.verify_tracklist = false;
        }
    }
}

/// Run the `tag` command.
///
/// # Errors
///
/// Returns an error if the pattern is invalid, the Discogs client cannot be created or the path
/// cannot be read. Errors that concern individual files are reported, but do not abort the run.
pub async fn run(config: &Config, args: Args) -> crate::Result<ExitCode> {
    let mut config = config.clone();
    args.apply_to(&mut config);

    let pattern = Pattern::compile(&config.pattern.template)?;
    let lookup = if config.discogs.enabled {
        if config.discogs.token.is_none() {
            log::warn!("No Discogs token configured, requests will be heavily rate-limited");
        }
        Some(ReleaseResolver::new(DiscogsClient::new(&config.discogs)?))
    } else {
        None
    };
    let tagger = Tagger::new(pattern, lookup)?
        .with_dry_run(args.dry_run)
        .with_separator(config.tagging.multi_value_separator.as_str());

    let files = collect_files(&args.path, args.recursive)?;
    if files.is_empty() {
        log::warn!("No supported audio files found in {}", args.path.display());
    }

    let report = tagger.run(&files).await;
    println!("{report}");

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_to() {
        let args = Args::try_parse_from([
            "tag",
            "music",
            "--pattern",
            "{track}. {artist} - {title}",
            "--discogs",
            "--discogs-token",
            "secret",
            "--no-verify",
            "-n",
            "-r",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert!(args.recursive);

        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.pattern.template, "{track}. {artist} - {title}");
        assert!(config.discogs.enabled);
        assert_eq!(config.discogs.token.as_deref(), Some("secret"));
        assert!(!config.discogs.verify_tracklist);
    }

    #[test]
    fn test_apply_to_keeps_config() {
        let args = Args::try_parse_from(["tag", "music"]).unwrap();
        let mut config = Config::default();
        config.discogs.enabled = true;
        args.apply_to(&mut config);
        assert_eq!(config, {
            let mut expected = Config::default();
            expected.discogs.enabled = true;
            expected
        });
    }
}
