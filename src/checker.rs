//! HTTP link validation with HEAD requests

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("HTTP error status {0}")]
    Http(StatusCode),

    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

/// Issues HEAD requests and classifies the responses
pub struct LinkChecker {
    client: Client,
}

impl LinkChecker {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Whether `url` declares itself as `text/html`.
    ///
    /// Request failures and error statuses count as "not HTML".
    pub async fn is_html_page(&self, url: &str) -> bool {
        let response = match self.client.head(url).send().await {
            Ok(r) if !is_error_status(r.status()) => r,
            Ok(r) => {
                tracing::debug!("{} answered {}", url, r.status());
                return false;
            }
            Err(e) => {
                tracing::debug!("content-type check failed for {}: {}", url, e);
                return false;
            }
        };

        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_html_content_type)
    }

    /// HEAD `url`, turning 4xx/5xx answers into [`CheckError::Http`]
    pub async fn check(&self, url: &str) -> Result<StatusCode, CheckError> {
        let status = self.client.head(url).send().await?.status();
        if is_error_status(status) {
            return Err(CheckError::Http(status));
        }
        Ok(status)
    }

    pub async fn is_valid(&self, url: &str) -> bool {
        let outcome = self.check(url).await;
        if let Err(e) = &outcome {
            tracing::debug!("{}: {}", url, e);
        }
        is_valid_outcome(&outcome)
    }

    /// The invalid subset of `urls`, in input order
    pub async fn invalid_links(&self, urls: &[String]) -> Vec<String> {
        let mut invalid = Vec::new();
        for url in urls {
            tracing::info!("  -> {}", truncate(url, 60));
            if !self.is_valid(url).await {
                invalid.push(url.clone());
            }
        }
        invalid
    }
}

/// 403 is accepted: many sites refuse HEAD requests or bots outright.
pub fn is_valid_outcome(outcome: &Result<StatusCode, CheckError>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(CheckError::Http(status)) => *status == StatusCode::FORBIDDEN,
        Err(CheckError::Network(_)) => false,
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

fn is_html_content_type(value: &str) -> bool {
    match value.parse::<mime::Mime>() {
        Ok(m) => m.type_() == mime::TEXT && m.subtype() == mime::HTML,
        Err(_) => false,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
