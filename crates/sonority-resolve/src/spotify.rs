//! Spotify Web API client and feature resolver.
//!
//! Authenticates with the client-credentials flow, searches tracks by
//! name, and fetches per-track audio features. Access tokens are cached
//! until shortly before they expire. Requests go through a
//! [`RateLimiter`] and transient failures are retried with exponential
//! backoff.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backon::Retryable;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

use sonority_core::RawFeatureResponse;

use crate::error::{ResolveError, ResolveResult};
use crate::resilience::{backoff, RateLimiter};
use crate::resolver::FeatureResolver;
use crate::seed::{track_id_from_link, Seed};
use crate::selection::SelectionPolicy;

const SOURCE_NAME: &str = "Spotify";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Number of search results considered when resolving by name.
const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Refresh tokens this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<Option<TrackSummary>>,
}

/// A track as listed in search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackSummary {
    /// Spotify track ID.
    pub id: String,
    /// Track title.
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistSummary>,
}

/// An artist credit on a [`TrackSummary`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistSummary {
    pub name: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Spotify Web API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    token_url: String,
    token: Arc<Mutex<Option<CachedToken>>>,
    rate_limiter: RateLimiter,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a new Spotify client from app credentials.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> ResolveResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("sonority/0.1.0 (https://github.com/oxur/sonority)")
            .build()?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: SPOTIFY_API_BASE.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            token: Arc::new(Mutex::new(None)),
            rate_limiter: RateLimiter::new(10),
        })
    }

    /// Point the client at different endpoints (for proxies and tests).
    #[must_use]
    pub fn with_endpoints(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    /// Return a valid access token, fetching a new one if needed.
    async fn access_token(&self) -> ResolveResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        log::debug!("Requesting Spotify access token");
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(ResolveError::Auth {
                source_name: SOURCE_NAME.to_string(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let response = check_status(response, "access token")?;

        let token: TokenResponse = response.json().await.map_err(|e| ResolveError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Authenticated GET against the API.
    async fn get(&self, path: &str, query: &[(&str, &str)], entity: &str) -> ResolveResult<Response> {
        let token = self.access_token().await?;
        self.rate_limiter.acquire().await;

        let url = format!("{}{}", self.api_base, path);
        let response = self.http.get(&url).bearer_auth(token).query(query).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            return Err(ResolveError::TokenExpired {
                source_name: SOURCE_NAME.to_string(),
            });
        }
        check_status(response, entity)
    }

    async fn search_tracks_once(&self, query: &str, limit: u32) -> ResolveResult<Vec<TrackSummary>> {
        let limit = limit.to_string();
        let response = self
            .get("/search", &[("q", query), ("type", "track"), ("limit", &limit)], "track search")
            .await?;

        let result: SearchResponse = response.json().await.map_err(|e| ResolveError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(result.tracks.items.into_iter().flatten().collect())
    }

    /// Search tracks by free text.
    pub async fn search_tracks(&self, query: &str, limit: u32) -> ResolveResult<Vec<TrackSummary>> {
        (|| self.search_tracks_once(query, limit))
            .retry(backoff())
            .when(ResolveError::is_transient)
            .notify(|err, dur| log::warn!("Retrying Spotify search in {:?}: {}", dur, err))
            .await
    }

    async fn audio_features_once(&self, track_id: &str) -> ResolveResult<RawFeatureResponse> {
        let path = format!("/audio-features/{}", track_id);
        let response = self.get(&path, &[], "audio features").await?;

        let value: serde_json::Value = response.json().await.map_err(|e| ResolveError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(RawFeatureResponse::from_value(value))
    }

    /// Fetch the raw audio-features record for a track.
    ///
    /// A track Spotify does not know yields an empty response.
    pub async fn audio_features(&self, track_id: &str) -> ResolveResult<RawFeatureResponse> {
        let result = (|| self.audio_features_once(track_id))
            .retry(backoff())
            .when(ResolveError::is_transient)
            .notify(|err, dur| log::warn!("Retrying Spotify audio features in {:?}: {}", dur, err))
            .await;

        empty_if_not_found(result, track_id)
    }
}

/// Turn a not-found lookup into an empty record so the adapter reports
/// missing features instead of a transport failure.
fn empty_if_not_found(
    result: ResolveResult<RawFeatureResponse>,
    track_id: &str,
) -> ResolveResult<RawFeatureResponse> {
    match result {
        Err(e) if e.is_not_found() => {
            log::info!("Spotify has no audio features for track {}", track_id);
            Ok(RawFeatureResponse::empty())
        }
        other => other,
    }
}

/// Map non-success statuses to errors.
fn check_status(response: Response, entity: &str) -> ResolveResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::NOT_FOUND => ResolveError::NotFound {
            entity: entity.to_string(),
            source_name: SOURCE_NAME.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => ResolveError::RateLimited {
            source_name: SOURCE_NAME.to_string(),
        },
        s if s.is_server_error() => ResolveError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: format!("{} returned {}", entity, s),
        },
        s => ResolveError::Rejected {
            source_name: SOURCE_NAME.to_string(),
            status: s.as_u16(),
        },
    })
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves seeds to audio features through the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyResolver {
    client: SpotifyClient,
    selection: SelectionPolicy,
    search_limit: u32,
}

impl SpotifyResolver {
    pub fn new(client: SpotifyClient, selection: SelectionPolicy) -> Self {
        Self {
            client,
            selection,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// How many search results name lookups consider.
    #[must_use]
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.clamp(1, 50);
        self
    }

    pub fn selection(&self) -> SelectionPolicy {
        self.selection
    }

    /// Find the track id for a name query, or `None` when nothing matches.
    pub async fn find_track(&self, name: &str) -> ResolveResult<Option<TrackSummary>> {
        let results = self.client.search_tracks(name, self.search_limit).await?;
        log::debug!("Search for '{}' returned {} tracks", name, results.len());

        let picked = self.selection.select(name, &results).cloned();
        match &picked {
            Some(track) => log::info!(
                "Resolved '{}' to '{}' ({}) via {}",
                name,
                track.name,
                track.id,
                self.selection
            ),
            None => log::info!("No search result for '{}' under {}", name, self.selection),
        }
        Ok(picked)
    }
}

#[async_trait]
impl FeatureResolver for SpotifyResolver {
    async fn resolve(&self, seed: &Seed) -> ResolveResult<RawFeatureResponse> {
        let track_id = match seed {
            Seed::Link(link) => track_id_from_link(link)?,
            Seed::Name(name) => match self.find_track(name).await? {
                Some(track) => track.id,
                None => return Ok(RawFeatureResponse::empty()),
            },
        };

        self.client.audio_features(&track_id).await
    }
}
