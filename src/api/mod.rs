//! Backend HTTP clients
//!
//! Two independent clients: [`ApiClient`] for account and pose endpoints, and
//! [`ChatClient`] for the chat backend, which gets far longer timeouts. Both
//! are plain values built from an [`ApiConfig`](crate::ApiConfig) and passed
//! to whoever needs them.

pub mod client;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{ApiClient, ChatClient};
pub use models::*;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP client setup failed: {0}")]
    Init(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text suitable for showing to the user after `action` failed.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ApiError::Status { status, .. } => format!("{action} failed: HTTP {status}"),
            ApiError::Transport(e) if e.is_timeout() => {
                format!("{action} failed: the server took too long to respond")
            }
            ApiError::Transport(_) | ApiError::Init(_) => {
                format!("{action} failed: could not reach the server")
            }
            ApiError::Decode(_) => format!("{action} failed: unexpected server response"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Remote pose analysis, the only backend call the sampling pipeline makes.
#[async_trait]
pub trait PoseAnalyzer: Send + Sync {
    async fn analyze(&self, image_base64: String) -> Result<PoseAnalysis, ApiError>;
}
