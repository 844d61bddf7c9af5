// src/gateway/client.rs

use super::types::*;
use super::{CandidateSource, GatewayError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Client for the YouTube Data API v3.
///
/// Holds one `reqwest::Client` with a builder-level timeout; every call is a
/// single round trip with no internal retries.
pub struct YouTubeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("encore/0.1")
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

fn classify_status(status: StatusCode, message: String) -> GatewayError {
    match status.as_u16() {
        403 | 429 => GatewayError::RateLimited {
            status: status.as_u16(),
        },
        code => GatewayError::Api {
            status: code,
            message,
        },
    }
}

#[async_trait]
impl CandidateSource for YouTubeClient {
    async fn find_seed_candidate(&self, text: &str) -> Result<Option<Candidate>, GatewayError> {
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("videoCategoryId", "10"),
                    ("maxResults", "1"),
                    ("q", text),
                ],
            )
            .await?;

        let top = response
            .items
            .into_iter()
            .find_map(|item| {
                let video_id = item.id.video_id?;
                Some(Candidate {
                    video_id,
                    title: item.snippet.title,
                    channel: item.snippet.channel_title,
                    description: item.snippet.description,
                    tags: item.snippet.tags,
                    view_count: 0,
                    duration_secs: None,
                })
            });
        debug!(query = text, found = top.is_some(), "seed candidate search");
        Ok(top)
    }

    async fn related_candidates(
        &self,
        video_id: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("relatedToVideoId", video_id),
                    ("maxResults", limit.as_str()),
                ],
            )
            .await?;

        let related: Vec<Candidate> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(Candidate {
                    video_id: id,
                    title: item.snippet.title,
                    channel: item.snippet.channel_title,
                    description: item.snippet.description,
                    tags: item.snippet.tags,
                    view_count: 0,
                    duration_secs: None,
                })
            })
            .collect();
        debug!(video_id, count = related.len(), "related candidates");
        Ok(related)
    }

    async fn batch_details(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, CandidateDetails>, GatewayError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let joined = ids.join(",");
        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("id", joined.as_str()),
                ],
            )
            .await?;

        // Ids the upstream does not recognize are simply absent from the map.
        let details = response
            .items
            .into_iter()
            .map(|item| {
                let view_count = item.view_count();
                let duration_secs = item.duration_secs();
                (
                    item.id,
                    CandidateDetails {
                        description: item.snippet.description,
                        tags: item.snippet.tags,
                        view_count,
                        duration_secs,
                    },
                )
            })
            .collect();
        Ok(details)
    }

    async fn popular_chart(
        &self,
        category_hint: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let limit = limit.to_string();
        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("chart", "mostPopular"),
                    ("videoCategoryId", category_hint),
                    ("maxResults", limit.as_str()),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(VideoItem::into_candidate)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_statuses_are_transient() {
        assert!(classify_status(StatusCode::FORBIDDEN, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(classify_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, String::new()).is_transient());
        assert!(!classify_status(StatusCode::NOT_FOUND, String::new()).is_transient());
    }
}
