//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use async_trait::async_trait;

use super::types::{KeywordMatch, MovieDetails, MoviePage, MovieSummary, PersonMatch};
use super::{CatalogError, CatalogService};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(CatalogError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 404 {
            return Err(CatalogError::NotFound(what.to_string()));
        }
        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl CatalogService for TmdbClient {
    async fn search_keywords(&self, query: &str) -> Result<Vec<KeywordMatch>, CatalogError> {
        debug!("TMDB keyword search: '{}'", query);
        let response: TmdbListResponse<TmdbKeywordResult> = self
            .get_json(
                "/search/keyword",
                &[("query", query.to_string())],
                "keyword search",
            )
            .await?;
        Ok(response.results.into_iter().map(|r| r.into()).collect())
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonMatch>, CatalogError> {
        debug!("TMDB person search: '{}'", query);
        let response: TmdbListResponse<TmdbPersonResult> = self
            .get_json(
                "/search/person",
                &[("query", query.to_string())],
                "person search",
            )
            .await?;

        let mut people: Vec<PersonMatch> =
            response.results.into_iter().map(|r| r.into()).collect();
        people.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(people)
    }

    async fn movies_by_keyword(
        &self,
        keyword_id: u32,
        page: u32,
    ) -> Result<MoviePage, CatalogError> {
        debug!("TMDB discover: keyword={}, page={}", keyword_id, page);
        let response: TmdbDiscoverResponse = self
            .get_json(
                "/discover/movie",
                &[
                    ("with_keywords", keyword_id.to_string()),
                    ("sort_by", "popularity.desc".to_string()),
                    ("page", page.to_string()),
                ],
                "keyword discovery",
            )
            .await?;

        Ok(MoviePage {
            page: response.page,
            total_pages: response.total_pages,
            movies: response.results.into_iter().map(|r| r.into()).collect(),
        })
    }

    async fn person_movie_credits(
        &self,
        person_id: u32,
    ) -> Result<Vec<MovieSummary>, CatalogError> {
        debug!("TMDB movie credits: person={}", person_id);
        let response: TmdbCreditsResponse = self
            .get_json(
                &format!("/person/{}/movie_credits", person_id),
                &[],
                &format!("person {} credits", person_id),
            )
            .await?;

        let mut movies: Vec<MovieSummary> =
            response.cast.into_iter().map(|r| r.into()).collect();
        movies.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(movies)
    }

    async fn movie_details(&self, movie_id: u32) -> Result<MovieDetails, CatalogError> {
        debug!("TMDB movie details: id={}", movie_id);
        let response: TmdbMovieDetails = self
            .get_json(
                &format!("/movie/{}", movie_id),
                &[("append_to_response", "release_dates".to_string())],
                &format!("movie {}", movie_id),
            )
            .await?;
        Ok(response.into())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbListResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbDiscoverResponse {
    page: u32,
    total_pages: u32,
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbCreditsResponse {
    #[serde(default)]
    cast: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbKeywordResult {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbPersonResult {
    id: u32,
    name: String,
    popularity: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    release_date: Option<String>,
    popularity: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    title: String,
    release_date: Option<String>,
    runtime: Option<u32>,
    overview: Option<String>,
    imdb_id: Option<String>,
    release_dates: Option<TmdbReleaseDates>,
}

#[derive(Debug, Deserialize)]
struct TmdbReleaseDates {
    #[serde(default)]
    results: Vec<TmdbCountryReleases>,
}

#[derive(Debug, Deserialize)]
struct TmdbCountryReleases {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<TmdbCertifiedRelease>,
}

#[derive(Debug, Deserialize)]
struct TmdbCertifiedRelease {
    certification: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbKeywordResult> for KeywordMatch {
    fn from(r: TmdbKeywordResult) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

impl From<TmdbPersonResult> for PersonMatch {
    fn from(r: TmdbPersonResult) -> Self {
        Self {
            id: r.id,
            name: r.name,
            popularity: r.popularity.unwrap_or(0.0),
        }
    }
}

impl From<TmdbMovieResult> for MovieSummary {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            release_date: r.release_date.filter(|d| !d.is_empty()),
            popularity: r.popularity.unwrap_or(0.0),
        }
    }
}

impl From<TmdbMovieDetails> for MovieDetails {
    fn from(d: TmdbMovieDetails) -> Self {
        let certification = d.release_dates.as_ref().and_then(|rd| {
            rd.results
                .iter()
                .find(|c| c.iso_3166_1 == "US")
                .and_then(|c| {
                    c.release_dates
                        .iter()
                        .filter_map(|r| r.certification.as_deref())
                        .find(|c| !c.is_empty())
                })
                .map(|c| c.to_string())
        });

        Self {
            id: d.id,
            title: d.title,
            release_date: d.release_date.filter(|r| !r.is_empty()),
            runtime_minutes: d.runtime,
            overview: d.overview,
            certification,
            imdb_id: d.imdb_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = TmdbClient::new(TmdbConfig {
            api_key: String::new(),
            base_url: None,
        });
        assert!(matches!(result, Err(CatalogError::NotConfigured(_))));
    }

    #[test]
    fn test_movie_result_conversion_blank_release_date() {
        let result = TmdbMovieResult {
            id: 603,
            title: "The Matrix".to_string(),
            release_date: Some(String::new()),
            popularity: Some(80.5),
        };
        let movie: MovieSummary = result.into();
        assert!(movie.release_date.is_none());
        assert_eq!(movie.year(), None);
    }

    #[test]
    fn test_movie_details_conversion_picks_us_certification() {
        let details = TmdbMovieDetails {
            id: 603,
            title: "The Matrix".to_string(),
            release_date: Some("1999-03-30".to_string()),
            runtime: Some(136),
            overview: Some("A computer hacker...".to_string()),
            imdb_id: Some("tt0133093".to_string()),
            release_dates: Some(TmdbReleaseDates {
                results: vec![
                    TmdbCountryReleases {
                        iso_3166_1: "DE".to_string(),
                        release_dates: vec![TmdbCertifiedRelease {
                            certification: Some("16".to_string()),
                        }],
                    },
                    TmdbCountryReleases {
                        iso_3166_1: "US".to_string(),
                        release_dates: vec![
                            TmdbCertifiedRelease {
                                certification: Some(String::new()),
                            },
                            TmdbCertifiedRelease {
                                certification: Some("R".to_string()),
                            },
                        ],
                    },
                ],
            }),
        };

        let movie: MovieDetails = details.into();
        assert_eq!(movie.certification.as_deref(), Some("R"));
        assert_eq!(movie.runtime_minutes, Some(136));
        assert_eq!(movie.year(), Some(1999));
    }

    #[test]
    fn test_movie_details_conversion_no_certification() {
        let details = TmdbMovieDetails {
            id: 1,
            title: "Obscure".to_string(),
            release_date: None,
            runtime: None,
            overview: None,
            imdb_id: None,
            release_dates: None,
        };
        let movie: MovieDetails = details.into();
        assert!(movie.certification.is_none());
    }
}
