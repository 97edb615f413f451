use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::api::models::*;
use crate::api::{ApiError, PoseAnalyzer};
use crate::ApiConfig;

/// Client for the account and pose endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Client for the chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

fn build_http(config: &ApiConfig) -> Result<reqwest::Client, ApiError> {
    let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout());
    if let Some(read) = config.read_timeout() {
        builder = builder.read_timeout(read);
    }
    if let Some(total) = config.request_timeout() {
        builder = builder.timeout(total);
    }
    builder.build().map_err(ApiError::Init)
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(ApiError::Transport)?;
    trace!(status = status.as_u16(), body = %String::from_utf8_lossy(&body), "Response body");

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
    http: &reqwest::Client,
    url: String,
    body: &B,
) -> Result<R, ApiError> {
    debug!(%url, "POST");
    let response = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(ApiError::Transport)?;
    read_json(response).await
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Health check, `GET /`
    pub async fn ping(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let url = join(&self.base_url, "/");
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        read_json(response).await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<StatusResponse, ApiError> {
        post_json(&self.http, join(&self.base_url, "/signup"), request).await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<StatusResponse, ApiError> {
        post_json(&self.http, join(&self.base_url, "/login"), request).await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn update_user_info(
        &self,
        request: &UserInfoRequest,
    ) -> Result<StatusResponse, ApiError> {
        post_json(&self.http, join(&self.base_url, "/user/info"), request).await
    }

    pub async fn analyze_pose(&self, request: &PoseImageRequest) -> Result<PoseAnalysis, ApiError> {
        post_json(&self.http, join(&self.base_url, "/pose/analyze"), request).await
    }
}

#[async_trait]
impl PoseAnalyzer for ApiClient {
    async fn analyze(&self, image_base64: String) -> Result<PoseAnalysis, ApiError> {
        self.analyze_pose(&PoseImageRequest { image_base64 }).await
    }
}

impl ChatClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http(config)?,
            base_url: config.base_url.clone(),
        })
    }

    #[instrument(skip_all)]
    pub async fn send(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let request = ChatRequest {
            message: message.to_owned(),
        };
        post_json(&self.http, join(&self.base_url, "/api/chat"), &request).await
    }
}
