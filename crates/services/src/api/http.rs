use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use skillpath_core::model::{
    AssessmentConfiguration, AssessmentId, AssessmentResult, SuggestedTopic,
};
use skillpath_core::reconcile::SubmissionPayload;

use super::{AssessmentApi, GeneratedAssessment, RoadmapRequest};
use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `AssessmentApi` over JSON/HTTP.
///
/// Every request carries the configured timeout; expiry surfaces as `ApiError::Timeout`.
#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpAssessmentApi {
    /// Build a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` for an unusable base URL, or
    /// `ApiError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(config.base_url.clone()))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "assessment service request failed");
            ApiError::from(err)
        })?;

        let status = response.status();
        debug!(url = %response.url(), %status, "assessment service responded");
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn generate_topics(&self, prompt: &str) -> Result<Vec<SuggestedTopic>, ApiError> {
        let url = self.endpoint(&["topics"])?;
        let body: TopicsResponse = self
            .send_json(self.client.post(url).json(&TopicsRequest { prompt }))
            .await?;
        Ok(body.topics)
    }

    async fn generate_assessment(
        &self,
        configuration: &AssessmentConfiguration,
    ) -> Result<GeneratedAssessment, ApiError> {
        let url = self.endpoint(&["assessments"])?;
        self.send_json(self.client.post(url).json(configuration))
            .await
    }

    async fn fetch_assessment(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<GeneratedAssessment, ApiError> {
        let url = self.endpoint(&["assessments", assessment_id.as_str()])?;
        self.send_json(self.client.get(url)).await
    }

    async fn submit_assessment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<AssessmentResult, ApiError> {
        let url = self.endpoint(&["assessments", payload.assessment_id.as_str(), "submit"])?;
        self.send_json(self.client.post(url).json(payload)).await
    }

    async fn generate_roadmap(&self, request: &RoadmapRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["roadmaps"])?;
        self.send(self.client.post(url).json(request)).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TopicsRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    topics: Vec<SuggestedTopic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_joined_and_escaped() {
        let api = HttpAssessmentApi::new(ApiConfig::new("https://api.example.com/v1/")).unwrap();
        let url = api.endpoint(&["assessments", "a 1/x", "submit"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/assessments/a%201%2Fx/submit"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpAssessmentApi::new(ApiConfig::new("not a url")),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpAssessmentApi::new(ApiConfig::new("mailto:me@example.com")),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let config = ApiConfig::new("https://api.example.com").with_api_key(Some("  ".into()));
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, ApiConfig::DEFAULT_TIMEOUT);
    }
}
