// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Resolve the earliest release of a track on Discogs.

use crate::discogs::{DiscogsCandidate, DiscogsClient};
use crate::util::{current_year, normalize, parse_plausible_year};
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

/// Encountered when a Discogs lookup fails.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The request could not be sent or the response could not be received.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server responded with an unexpected status code.
    #[error("Unexpected HTTP status {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The server kept responding with HTTP 429 (Too Many Requests).
    #[error("Rate-limited by Discogs ({attempts} attempts)")]
    RateLimited {
        /// Number of requests sent.
        attempts: u32,
    },
    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    /// The configured token cannot be sent as an HTTP header.
    #[error("Invalid Discogs token")]
    InvalidToken,
}

/// The release that was selected as the earliest valid release of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRelease {
    /// Discogs release ID.
    pub release_id: u64,
    /// Discogs master release ID.
    pub master_id: Option<u64>,
    /// Release artist.
    pub artist: String,
    /// Release title.
    pub title: String,
    /// Release year, if it was plausible.
    pub year: Option<u16>,
    /// Genres.
    pub genres: Vec<String>,
    /// Styles.
    pub styles: Vec<String>,
    /// First record label.
    pub label: Option<String>,
    /// Release country.
    pub country: Option<String>,
    /// Media format.
    pub format: Option<String>,
}

impl ResolvedRelease {
    /// Create the resolved release from a candidate and its plausible year.
    fn from_candidate(candidate: &DiscogsCandidate, year: Option<u16>) -> Self {
        Self {
            release_id: candidate.release_id,
            master_id: candidate.master_id,
            artist: candidate.artist.clone(),
            title: candidate.title.clone(),
            year,
            genres: candidate.genres.clone(),
            styles: candidate.styles.clone(),
            label: candidate.label.clone(),
            country: candidate.country.clone(),
            format: candidate.format.clone(),
        }
    }

    /// URL of the release page on the Discogs website.
    #[must_use]
    pub fn release_url(&self) -> String {
        format!("https://www.discogs.com/release/{}", self.release_id)
    }
}

/// Order the candidates by preference.
///
/// Candidates with a plausible year come first, sorted by year, preferring candidates that belong
/// to a master release and then the order in which they were found. Candidates without a
/// plausible year follow in the order in which they were found.
fn rank_candidates(
    candidates: &[DiscogsCandidate],
    current_year: i32,
) -> Vec<(&DiscogsCandidate, Option<u16>)> {
    let mut ranked: Vec<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let year = candidate
                .year
                .as_deref()
                .and_then(|year| parse_plausible_year(year, current_year));
            (index, candidate, year)
        })
        .collect();
    ranked.sort_by_key(|&(index, candidate, year)| {
        (
            year.is_none(),
            year.unwrap_or_default(),
            year.is_some() && candidate.master_id.is_none(),
            index,
        )
    });
    ranked
        .into_iter()
        .map(|(_, candidate, year)| (candidate, year))
        .collect()
}

/// Select the earliest release among the candidates.
///
/// Returns `None` if there are no candidates. If no candidate has a plausible year, the first
/// candidate is returned without a year.
#[must_use]
pub fn select_release(
    candidates: &[DiscogsCandidate],
    current_year: i32,
) -> Option<ResolvedRelease> {
    rank_candidates(candidates, current_year)
        .first()
        .map(|&(candidate, year)| ResolvedRelease::from_candidate(candidate, year))
}

/// Looks up the release a track was first released on.
pub trait ReleaseLookup {
    /// Resolve the earliest release of the track `title` by `artist`.
    fn resolve(
        &self,
        artist: &str,
        title: &str,
    ) -> impl Future<Output = Result<Option<ResolvedRelease>, ResolutionError>>;
}

/// Resolves releases using the Discogs API.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    /// Discogs client.
    client: DiscogsClient,
    /// Fetch tracklists to check that a release contains the track.
    verify_tracklist: bool,
    /// Maximum number of tracklists fetched per track.
    max_verifications: usize,
}

impl ReleaseResolver {
    /// Create a new resolver using the given client and its configuration.
    #[must_use]
    pub fn new(client: DiscogsClient) -> Self {
        let verify_tracklist = client.config().verify_tracklist;
        let max_verifications = client.config().max_verifications;
        Self {
            client,
            verify_tracklist,
            max_verifications,
        }
    }

    /// Enable or disable tracklist verification.
    #[must_use]
    pub fn with_verify_tracklist(mut self, verify_tracklist: bool) -> Self {
        self.verify_tracklist = verify_tracklist;
        self
    }

    /// Check if the tracklist of the release contains the (normalized) title.
    ///
    /// Releases whose tracklist is unavailable (e.g. HTTP 404) or malformed are treated as not
    /// containing the track.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the retries after being rate-limited are
    /// exhausted, because an earlier release could be skipped otherwise.
    async fn tracklist_contains(
        &self,
        release_id: u64,
        normalized_title: &str,
    ) -> Result<bool, ResolutionError> {
        match self.client.release(release_id).await {
            Ok(release) => Ok(release
                .tracklist
                .iter()
                .any(|track| normalize(&track.title) == normalized_title)),
            Err(err @ (ResolutionError::Status { .. } | ResolutionError::Decode(_))) => {
                log::warn!("Failed to fetch tracklist of release {release_id}: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

impl ReleaseLookup for ReleaseResolver {
    async fn resolve(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<ResolvedRelease>, ResolutionError> {
        let normalized_artist = normalize(artist);
        let normalized_title = normalize(title);

        let candidates: Vec<_> = self
            .client
            .search(artist, title)
            .await?
            .into_iter()
            .filter(|candidate| {
                let is_match = normalize(&candidate.artist) == normalized_artist;
                if !is_match {
                    log::debug!(
                        "Ignoring release {} by {:?} (artist mismatch)",
                        candidate.release_id,
                        candidate.artist
                    );
                }
                is_match
            })
            .collect();

        let mut verifications = 0;
        for (candidate, year) in rank_candidates(&candidates, current_year()) {
            if !self.verify_tracklist || normalize(&candidate.title) == normalized_title {
                return Ok(Some(ResolvedRelease::from_candidate(candidate, year)));
            }

            if verifications >= self.max_verifications {
                continue;
            }
            verifications += 1;

            if self
                .tracklist_contains(candidate.release_id, &normalized_title)
                .await?
            {
                return Ok(Some(ResolvedRelease::from_candidate(candidate, year)));
            }
            log::debug!(
                "Release {} does not contain {title:?}",
                candidate.release_id
            );
        }

        log::info!("No matching Discogs release found for {artist:?} / {title:?}");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscogsConfig;
    use crate::Config;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(release_id: u64, year: Option<&str>, master_id: Option<u64>) -> DiscogsCandidate {
        DiscogsCandidate {
            release_id,
            master_id,
            year: year.map(ToString::to_string),
            genres: vec!["Rock".to_string()],
            styles: vec![],
            label: None,
            title: "The Wall".to_string(),
            artist: "Pink Floyd".to_string(),
            country: None,
            format: None,
        }
    }

    #[test]
    fn test_select_earliest_year() {
        let candidates = [
            candidate(1, Some("1994"), None),
            candidate(2, Some("1979"), None),
            candidate(3, Some("1979"), Some(10)),
        ];
        let release = select_release(&candidates, 2025).unwrap();
        assert_eq!(release.release_id, 3);
        assert_eq!(release.year, Some(1979));
    }

    #[test]
    fn test_select_first_seen_on_tie() {
        let candidates = [
            candidate(1, Some("1994"), None),
            candidate(2, Some("1979"), None),
            candidate(3, Some("1979"), None),
        ];
        assert_eq!(select_release(&candidates, 2025).unwrap().release_id, 2);
    }

    #[test]
    fn test_select_ignores_implausible_years() {
        let candidates = [
            candidate(1, Some("0"), Some(10)),
            candidate(2, None, None),
            candidate(3, Some("2003"), None),
            candidate(4, Some("1850"), None),
        ];
        assert_eq!(select_release(&candidates, 2025).unwrap().release_id, 3);
    }

    #[test]
    fn test_select_without_plausible_year() {
        let candidates = [
            candidate(1, Some(""), None),
            candidate(2, Some("0"), Some(10)),
        ];
        let release = select_release(&candidates, 2025).unwrap();
        assert_eq!(release.release_id, 1);
        assert_eq!(release.year, None);
    }

    #[test]
    fn test_select_without_candidates() {
        assert_eq!(select_release(&[], 2025), None);
    }

    #[test]
    fn test_release_url() {
        let release = select_release(&[candidate(1234, None, None)], 2025).unwrap();
        assert_eq!(release.release_url(), "https://www.discogs.com/release/1234");
    }

    fn config(server: &MockServer) -> DiscogsConfig {
        DiscogsConfig {
            base_url: server.uri(),
            cache: false,
            retry_base_delay_ms: 1,
            ..Config::default().discogs
        }
    }

    async fn mount_search(server: &MockServer, results: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/database/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagination": {"page": 1, "pages": 1},
                "results": results,
            })))
            .mount(server)
            .await;
    }

    async fn mount_tracklist(server: &MockServer, release_id: u64, titles: &[&str]) {
        let tracklist: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| json!({"position": format!("A{}", i + 1), "title": title}))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/releases/{release_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": release_id,
                "tracklist": tracklist,
            })))
            .mount(server)
            .await;
    }

    fn resolver(config: &DiscogsConfig) -> ReleaseResolver {
        ReleaseResolver::new(DiscogsClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_resolve_filters_artist() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Various - Hits Of The 70s", "year": "1975"},
                {"id": 2, "title": "Pink Floyd* - The Wall", "year": "1979", "genre": ["Rock"]},
            ]),
        )
        .await;
        mount_tracklist(&server, 1, &["Hey You"]).await;
        mount_tracklist(&server, 2, &["In The Flesh?", "Hey You"]).await;

        let release = resolver(&config(&server))
            .resolve("Pink Floyd", "Hey You")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(release.release_id, 2);
        assert_eq!(release.year, Some(1979));
        assert_eq!(release.genres, vec!["Rock".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_title_match_without_verification_request() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Pink Floyd - Hey You", "year": "1980"},
            ]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/releases/1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let release = resolver(&config(&server))
            .resolve("Pink Floyd", "hey you!")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(release.release_id, 1);
    }

    #[tokio::test]
    async fn test_resolve_skips_releases_without_track() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Pink Floyd - Live At Pompeii", "year": "1972"},
                {"id": 2, "title": "Pink Floyd - The Wall", "year": "1979"},
            ]),
        )
        .await;
        mount_tracklist(&server, 1, &["Echoes"]).await;
        mount_tracklist(&server, 2, &["Hey You"]).await;

        let release = resolver(&config(&server))
            .resolve("Pink Floyd", "Hey You")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(release.release_id, 2);
    }

    #[tokio::test]
    async fn test_resolve_without_verification() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Pink Floyd - Live At Pompeii", "year": "1972"},
                {"id": 2, "title": "Pink Floyd - The Wall", "year": "1979"},
            ]),
        )
        .await;

        let release = resolver(&config(&server))
            .with_verify_tracklist(false)
            .resolve("Pink Floyd", "Hey You")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(release.release_id, 1);
    }

    #[tokio::test]
    async fn test_resolve_limits_verifications() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Pink Floyd - A", "year": "1970"},
                {"id": 2, "title": "Pink Floyd - B", "year": "1971"},
                {"id": 3, "title": "Pink Floyd - C", "year": "1972"},
            ]),
        )
        .await;
        mount_tracklist(&server, 1, &["Other"]).await;
        Mock::given(method("GET"))
            .and(path("/releases/2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_tracklist(&server, 3, &["Hey You"]).await;

        let config = DiscogsConfig {
            max_verifications: 2,
            ..config(&server)
        };
        let result = resolver(&config)
            .resolve("Pink Floyd", "Hey You")
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_resolve_fails_when_rate_limited_during_verification() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            json!([
                {"id": 1, "title": "Pink Floyd - The Wall", "year": "1979"},
                {"id": 2, "title": "Pink Floyd - Echoes", "year": "2001"},
            ]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/releases/1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        mount_tracklist(&server, 2, &["Hey You"]).await;

        let config = DiscogsConfig {
            max_retries: 1,
            ..config(&server)
        };
        let result = resolver(&config).resolve("Pink Floyd", "Hey You").await;
        assert!(matches!(
            result,
            Err(ResolutionError::RateLimited { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn test_resolve_search_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/database/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = resolver(&config(&server))
            .resolve("Pink Floyd", "Hey You")
            .await;
        assert!(matches!(
            result,
            Err(ResolutionError::Status { status: 500, .. })
        ));
    }
}
