// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Client for the [Discogs API](https://www.discogs.com/developers).

use crate::cache::Cache;
use crate::config::{DiscogsConfig, XDG_PREFIX};
use crate::resolver::ResolutionError;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use xdg::BaseDirectories;

/// Year of a search result. Discogs usually returns a string, but some endpoints use numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawYear {
    /// Numeric year.
    Number(i64),
    /// Textual year (possibly empty or a full date).
    Text(String),
}

/// Pagination info of a search result page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    /// Current page (1-based).
    #[serde(default)]
    pub page: u32,
    /// Total number of pages.
    #[serde(default)]
    pub pages: u32,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResult {
    /// Release ID.
    pub id: u64,
    /// Combined `Artist - Title` string.
    #[serde(default)]
    pub title: String,
    /// Release year.
    #[serde(default)]
    pub year: Option<RawYear>,
    /// Genres.
    #[serde(default)]
    pub genre: Vec<String>,
    /// Styles.
    #[serde(default)]
    pub style: Vec<String>,
    /// Record labels.
    #[serde(default)]
    pub label: Vec<String>,
    /// Master release ID (`0` if there is none).
    #[serde(default)]
    pub master_id: Option<u64>,
    /// Release country.
    #[serde(default)]
    pub country: Option<String>,
    /// Media formats and descriptions.
    #[serde(default)]
    pub format: Vec<String>,
}

/// A page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchPage {
    /// Pagination info.
    #[serde(default)]
    pub pagination: Pagination,
    /// Results on this page.
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// A track of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TracklistEntry {
    /// Position on the release (e.g. `A1`).
    #[serde(default)]
    pub position: String,
    /// Track title.
    #[serde(default)]
    pub title: String,
}

/// Details of a release, as far as needed for tracklist verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseDetails {
    /// Release ID.
    pub id: u64,
    /// Tracks of the release.
    #[serde(default)]
    pub tracklist: Vec<TracklistEntry>,
}

/// A candidate release found by searching Discogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscogsCandidate {
    /// Release ID.
    pub release_id: u64,
    /// Master release ID, if the release belongs to one.
    pub master_id: Option<u64>,
    /// Release year as returned by the API. May be empty or invalid.
    pub year: Option<String>,
    /// Genres.
    pub genres: Vec<String>,
    /// Styles.
    pub styles: Vec<String>,
    /// First record label.
    pub label: Option<String>,
    /// Release title.
    pub title: String,
    /// Release artist.
    pub artist: String,
    /// Release country.
    pub country: Option<String>,
    /// Media format (e.g. `Vinyl, LP, Album`).
    pub format: Option<String>,
}

impl From<SearchResult> for DiscogsCandidate {
    fn from(result: SearchResult) -> Self {
        let (artist, title) = match result.title.split_once(" - ") {
            Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
            None => (String::new(), result.title.trim().to_string()),
        };
        let year = result.year.map(|year| match year {
            RawYear::Number(number) => number.to_string(),
            RawYear::Text(text) => text,
        });

        DiscogsCandidate {
            release_id: result.id,
            master_id: result.master_id.filter(|&id| id != 0),
            year,
            genres: result.genre,
            styles: result.style,
            label: result.label.into_iter().next(),
            title,
            artist,
            country: result.country.filter(|country| !country.is_empty()),
            format: Some(result.format.join(", ")).filter(|format| !format.is_empty()),
        }
    }
}

/// Discogs API client.
#[derive(Debug, Clone)]
pub struct DiscogsClient {
    /// HTTP client.
    client: Client,
    /// Discogs configuration.
    config: DiscogsConfig,
    /// Response cache.
    cache: Option<BaseDirectories>,
}

impl DiscogsClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &DiscogsConfig) -> Result<Self, ResolutionError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref() {
            let value = format!("Discogs token={token}")
                .parse()
                .map_err(|_| ResolutionError::InvalidToken)?;
            let _previous = headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;
        let cache = config
            .cache
            .then(|| BaseDirectories::with_prefix(XDG_PREFIX));

        Ok(Self {
            client,
            config: config.clone(),
            cache,
        })
    }

    /// The configuration of this client.
    #[must_use]
    pub fn config(&self) -> &DiscogsConfig {
        &self.config
    }

    /// Build the URL for an API endpoint.
    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    /// Delay before the next attempt after being rate-limited, capped at `max_retry_delay`.
    fn retry_delay(&self, headers: &HeaderMap, attempt: u32) -> Duration {
        let delay = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or_else(
                || {
                    self.config
                        .retry_base_delay()
                        .saturating_mul(2u32.saturating_pow(attempt))
                },
                Duration::from_secs,
            );
        delay.min(self.config.max_retry_delay())
    }

    /// Send a GET request and decode the JSON response, retrying when rate-limited.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ResolutionError> {
        let url = self.url(endpoint);
        let mut attempt = 0;
        loop {
            log::debug!("Requesting {url} with {query:?}");
            let response = self.client.get(&url).query(query).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.config.max_retries {
                    return Err(ResolutionError::RateLimited {
                        attempts: attempt + 1,
                    });
                }

                let delay = self.retry_delay(response.headers(), attempt);
                log::warn!(
                    "Rate-limited by Discogs, retrying in {delay:?} (attempt {} of {})",
                    attempt + 1,
                    self.config.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(ResolutionError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(ResolutionError::Decode);
        }
    }

    /// Fetch a single page of release search results, using the cache if possible.
    async fn search_page(
        &self,
        artist: &str,
        title: &str,
        page: u32,
    ) -> Result<SearchPage, ResolutionError> {
        let per_page = self.config.per_page;
        if let Some(cache) = &self.cache {
            match cache.get_search_page(artist, title, per_page, page) {
                Ok(result) => {
                    log::debug!("Using cached search results for {artist:?} / {title:?} (page {page})");
                    return Ok(result);
                }
                Err(err) => log::debug!("Search results not cached: {err}"),
            }
        }

        let result: SearchPage = self
            .get_json(
                "/database/search",
                &[
                    ("type", "release".to_string()),
                    ("artist", artist.to_string()),
                    ("track", title.to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.insert_search_page(artist, title, per_page, page, &result) {
                log::warn!("Failed to insert search results into cache: {err}");
            }
        }

        Ok(result)
    }

    /// Search for releases that contain the track `title` by `artist`.
    ///
    /// Up to `max_pages` result pages are requested.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails.
    pub async fn search(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<DiscogsCandidate>, ResolutionError> {
        let mut candidates = vec![];
        for page in 1..=self.config.max_pages.max(1) {
            let result = self.search_page(artist, title, page).await?;
            let pages = result.pagination.pages;
            candidates.extend(result.results.into_iter().map(DiscogsCandidate::from));
            if page >= pages {
                break;
            }
        }

        log::debug!(
            "Found {} candidates for {artist:?} / {title:?}",
            candidates.len()
        );
        Ok(candidates)
    }

    /// Fetch the details (i.e. the tracklist) of a release, using the cache if possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn release(&self, release_id: u64) -> Result<ReleaseDetails, ResolutionError> {
        if let Some(cache) = &self.cache {
            match cache.get_release(release_id) {
                Ok(release) => return Ok(release),
                Err(err) => log::debug!("Release {release_id} not cached: {err}"),
            }
        }

        let release: ReleaseDetails = self
            .get_json(&format!("/releases/{release_id}"), &[])
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.insert_release(release_id, &release) {
                log::warn!("Failed to insert release {release_id} into cache: {err}");
            }
        }

        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> DiscogsConfig {
        DiscogsConfig {
            base_url: server.uri(),
            cache: false,
            retry_base_delay_ms: 1,
            ..Config::default().discogs
        }
    }

    fn search_result(id: u64, title: &str, year: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "year": year,
            "genre": ["Rock"],
            "style": ["Prog Rock"],
            "label": ["Harvest", "EMI"],
            "master_id": 0,
            "country": "UK",
            "format": ["Vinyl", "LP"],
        })
    }

    #[test]
    fn test_candidate_from_search_result() {
        let result: SearchResult =
            serde_json::from_value(search_result(1, "Pink Floyd - The Wall", "1979")).unwrap();
        let candidate = DiscogsCandidate::from(result);
        assert_eq!(candidate.release_id, 1);
        assert_eq!(candidate.master_id, None);
        assert_eq!(candidate.artist, "Pink Floyd");
        assert_eq!(candidate.title, "The Wall");
        assert_eq!(candidate.year.as_deref(), Some("1979"));
        assert_eq!(candidate.label.as_deref(), Some("Harvest"));
        assert_eq!(candidate.format.as_deref(), Some("Vinyl, LP"));
    }

    #[test]
    fn test_candidate_from_sparse_search_result() {
        let result: SearchResult = serde_json::from_value(json!({
            "id": 2,
            "title": "Untitled",
            "year": 1994,
            "master_id": 7,
        }))
        .unwrap();
        let candidate = DiscogsCandidate::from(result);
        assert_eq!(candidate.artist, "");
        assert_eq!(candidate.title, "Untitled");
        assert_eq!(candidate.year.as_deref(), Some("1994"));
        assert_eq!(candidate.master_id, Some(7));
        assert!(candidate.genres.is_empty());
        assert_eq!(candidate.label, None);
        assert_eq!(candidate.format, None);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/database/search"))
            .and(query_param("type", "release"))
            .and(query_param("artist", "Pink Floyd"))
            .and(query_param("track", "Hey You"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagination": {"page": 1, "pages": 2},
                "results": [search_result(1, "Pink Floyd - The Wall", "1979")],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/database/search"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagination": {"page": 2, "pages": 2},
                "results": [search_result(2, "Pink Floyd - Is There Anybody Out There?", "2000")],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DiscogsClient::new(&config(&server)).unwrap();
        let candidates = client.search("Pink Floyd", "Hey You").await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.release_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_search_respects_max_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/database/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagination": {"page": 1, "pages": 10},
                "results": [search_result(1, "Pink Floyd - The Wall", "1979")],
            })))
            .expect(2)
            .mount(&server)
            .await;

        let config = DiscogsConfig {
            max_pages: 2,
            ..config(&server)
        };
        let client = DiscogsClient::new(&config).unwrap();
        let candidates = client.search("Pink Floyd", "Hey You").await.unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .and(header("Authorization", "Discogs token=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "tracklist": [{"position": "A1", "title": "Hey You"}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = DiscogsConfig {
            token: Some("secret".to_string()),
            ..config(&server)
        };
        let client = DiscogsClient::new(&config).unwrap();
        let release = client.release(42).await.unwrap();
        assert_eq!(release.tracklist[0].title, "Hey You");
    }

    #[tokio::test]
    async fn test_rate_limit_retry_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "tracklist": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DiscogsClient::new(&config(&server)).unwrap();
        let release = client.release(42).await.unwrap();
        assert_eq!(release.id, 42);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let config = DiscogsConfig {
            max_retries: 2,
            ..config(&server)
        };
        let client = DiscogsClient::new(&config).unwrap();
        assert!(matches!(
            client.release(42).await,
            Err(ResolutionError::RateLimited { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = DiscogsClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.release(42).await,
            Err(ResolutionError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = DiscogsClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.release(42).await,
            Err(ResolutionError::Decode(_))
        ));
    }

    #[test]
    fn test_retry_delay() {
        let config = DiscogsConfig {
            cache: false,
            retry_base_delay_ms: 100,
            ..Config::default().discogs
        };
        let client = DiscogsClient::new(&config).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client.retry_delay(&headers, 0), Duration::from_millis(100));
        assert_eq!(client.retry_delay(&headers, 2), Duration::from_millis(400));

        let _previous = headers.insert(RETRY_AFTER, "5".parse().unwrap());
        assert_eq!(client.retry_delay(&headers, 2), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let config = DiscogsConfig {
            cache: false,
            retry_base_delay_ms: 1000,
            max_retry_delay_secs: 60,
            ..Config::default().discogs
        };
        let client = DiscogsClient::new(&config).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client.retry_delay(&headers, 10), Duration::from_secs(60));

        let _previous = headers.insert(RETRY_AFTER, "86400".parse().unwrap());
        assert_eq!(client.retry_delay(&headers, 0), Duration::from_secs(60));
    }
}
