//! HTTP client for the summarisation service.
//!
//! Uses reqwest for transport. Every operation returns the parsed JSON body
//! on success; non-2xx responses are normalised into [`ApiError::Server`]
//! carrying the server-provided message.

use crate::document::Document;
use crate::summary::{
    DocumentUploadResponse, ErrorBody, HealthStatus, SummaryMode, SummaryRequest, SummaryResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!(
    "smartsum/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/smartsum)"
);

const UPLOAD_FAILED: &str = "Failed to upload document";
const SUMMARIZE_FAILED: &str = "Failed to generate summary";
const SUMMARIZE_DOCUMENT_FAILED: &str = "Failed to summarize document";
const HEALTH_FAILED: &str = "API is not responding";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    /// Non-2xx response; displays as the bare server message.
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidUrl(_) => None,
        }
    }
}

/// Client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // Validate early so a bad config fails at startup rather than on first call.
        Url::parse(base_url)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Upload a document and extract its text.
    pub async fn upload_document(
        &self,
        document: &Document,
    ) -> Result<DocumentUploadResponse, ApiError> {
        let url = self.endpoint("/api/upload")?;
        log::info!("uploading {} ({} bytes)", document.name, document.size());

        let response = self
            .http
            .post(url)
            .multipart(file_form(document)?)
            .send()
            .await?;
        parse_json(response, UPLOAD_FAILED).await
    }

    /// Summarise raw text.
    pub async fn summarize_text(
        &self,
        text: &str,
        mode: SummaryMode,
        max_length: Option<u32>,
    ) -> Result<SummaryResponse, ApiError> {
        let url = self.endpoint("/api/summarize")?;
        let request = SummaryRequest::new(text, mode, max_length);
        log::info!(
            "summarizing {} characters as {}",
            text.chars().count(),
            request.summary_type
        );

        let response = self.http.post(url).json(&request).send().await?;
        parse_json(response, SUMMARIZE_FAILED).await
    }

    /// Upload a document and summarise it in one call.
    pub async fn summarize_document(
        &self,
        document: &Document,
        mode: SummaryMode,
        max_length: Option<u32>,
    ) -> Result<SummaryResponse, ApiError> {
        let url = self.summarize_document_url(mode, max_length)?;
        log::info!("summarizing document {} via {}", document.name, url);

        let response = self
            .http
            .post(url)
            .multipart(file_form(document)?)
            .send()
            .await?;
        parse_json(response, SUMMARIZE_DOCUMENT_FAILED).await
    }

    /// Check that the service is up. The error body is not inspected.
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint("/health")?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("health check returned {}", status);
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: HEALTH_FAILED.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    fn summarize_document_url(
        &self,
        mode: SummaryMode,
        max_length: Option<u32>,
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint("/api/summarize-document")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("summary_type", mode.summary_type());
            if let Some(max) = max_length.filter(|&m| m > 0) {
                query.append_pair("max_length", &max.to_string());
            }
        }
        Ok(url)
    }
}

fn file_form(document: &Document) -> Result<Form, ApiError> {
    let part = Part::bytes(document.content.clone())
        .file_name(document.name.clone())
        .mime_str(document.mime_type())?;
    Ok(Form::new().part("file", part))
}

/// Decode a success body, or turn an error body into [`ApiError::Server`].
async fn parse_json<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        log::debug!("{} {}", status, response.url());
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body, fallback);
    log::warn!("request failed with {}: {}", status, message);
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Message from a JSON error body, or `fallback` when there is none.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(
            client.endpoint("/health").unwrap().as_str(),
            "http://localhost:8000/health"
        );
    }

    #[test]
    fn document_url_carries_mode_and_length() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        let url = client
            .summarize_document_url(SummaryMode::Concise, None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/summarize-document?summary_type=concise"
        );

        let url = client
            .summarize_document_url(SummaryMode::Comprehensive, Some(300))
            .unwrap();
        assert_eq!(url.query(), Some("summary_type=bullet_points&max_length=300"));

        let url = client
            .summarize_document_url(SummaryMode::Balanced, Some(0))
            .unwrap();
        assert_eq!(url.query(), Some("summary_type=detailed"));
    }

    #[test]
    fn error_message_falls_back() {
        assert_eq!(error_message(r#"{"detail":"nope"}"#, "fallback"), "nope");
        assert_eq!(error_message("<html>502</html>", "fallback"), "fallback");
        assert_eq!(error_message(r#"{"detail":null}"#, "fallback"), "fallback");
    }

    #[test]
    fn server_error_displays_bare_message() {
        let err = ApiError::Server {
            status: 400,
            message: "File too large".into(),
        };
        assert_eq!(err.to_string(), "File too large");
        assert_eq!(err.status(), Some(400));
    }
}
