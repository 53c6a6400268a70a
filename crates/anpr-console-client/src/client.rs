//! HTTP client for the zone configuration and event search endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use anpr_console_core::ApiError;
use anpr_console_designer::{SavePayload, Zone};
use anpr_console_stream::{EventSearch, PlateEvent, SearchQuery};

use crate::records::{SearchResponse, ZoneRecord};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint layout relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    pub zones: String,
    pub search: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self {
            zones: "/config/zones".to_string(),
            search: "/events/search".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedZone {
    id: i64,
}

/// Thin wrapper over [`reqwest::Client`] mapping failures into [`ApiError`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    paths: ApiPaths,
}

impl ApiClient {
    /// Creates a client for `base_url`, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_options(base_url, ApiPaths::default(), DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        base_url: &str,
        paths: ApiPaths,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|_| ApiError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            paths,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `segments` onto the base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url.path_segments_mut().map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
            })?;
            parts.pop_if_empty();
            for segment in segments {
                for piece in segment.split('/').filter(|p| !p.is_empty()) {
                    parts.push(piece);
                }
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport {
            reason: e.to_string(),
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            tracing::warn!("API request failed with {}: {}", status, body);
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            reason: e.to_string(),
        })
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Lists all configured zones.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        let url = self.endpoint(&[&self.paths.zones])?;
        let records: Vec<ZoneRecord> = self.send_json(self.request(Method::GET, url)).await?;
        Ok(records.into_iter().map(ZoneRecord::into_zone).collect())
    }

    /// Fetches one zone. The backend has no single-zone route, so this
    /// filters the list.
    pub async fn get_zone(&self, id: i64) -> Result<Zone, ApiError> {
        self.list_zones()
            .await?
            .into_iter()
            .find(|zone| zone.id == Some(id))
            .ok_or_else(|| ApiError::Http {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: format!("Zone {} not found", id),
            })
    }

    /// Creates a zone and returns its new id.
    pub async fn create_zone(&self, payload: &SavePayload) -> Result<i64, ApiError> {
        let url = self.endpoint(&[&self.paths.zones])?;
        let created: CreatedZone = self
            .send_json(self.request(Method::POST, url).json(payload))
            .await?;
        tracing::info!("Created zone {} ({})", created.id, payload.name);
        Ok(created.id)
    }

    /// Replaces an existing zone.
    pub async fn update_zone(&self, id: i64, payload: &SavePayload) -> Result<i64, ApiError> {
        let url = self.endpoint(&[&self.paths.zones, &id.to_string()])?;
        self.send(self.request(Method::PUT, url).json(payload))
            .await?;
        tracing::info!("Updated zone {} ({})", id, payload.name);
        Ok(id)
    }

    /// Creates when `id` is `None`, otherwise updates.
    pub async fn save_zone(&self, id: Option<i64>, payload: &SavePayload) -> Result<i64, ApiError> {
        match id {
            Some(id) => self.update_zone(id, payload).await,
            None => self.create_zone(payload).await,
        }
    }

    pub async fn delete_zone(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&[&self.paths.zones, &id.to_string()])?;
        self.send(self.request(Method::DELETE, url)).await?;
        tracing::info!("Deleted zone {}", id);
        Ok(())
    }

    /// Runs a stored-event search. Results keep server order.
    pub async fn search_events(&self, query: &SearchQuery) -> Result<Vec<PlateEvent>, ApiError> {
        let url = self.endpoint(&[&self.paths.search])?;
        let response: SearchResponse = self
            .send_json(self.request(Method::GET, url).query(&query.to_query_pairs()))
            .await?;
        Ok(response.into_events())
    }
}

#[async_trait]
impl EventSearch for ApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlateEvent>, ApiError> {
        self.search_events(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let client = ApiClient::new("http://localhost:8000/api/").unwrap();
        let url = client.endpoint(&["config/zones", "7"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/config/zones/7");

        let client = ApiClient::new("http://localhost:8000/api").unwrap();
        let url = client.endpoint(&["events/search"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/events/search");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }
}
