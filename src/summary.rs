//! Wire types exchanged with the summarisation service.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Summarisation verbosity.
///
/// The display id (`balanced`) and the value sent as `summary_type`
/// (`detailed`) differ for two of the three modes; both spellings parse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Short, point-based summary
    Concise,
    /// Detailed but readable
    #[default]
    #[serde(alias = "detailed")]
    #[value(alias = "detailed")]
    Balanced,
    /// In-depth analysis
    #[serde(alias = "bullet_points")]
    #[value(alias = "bullet_points")]
    Comprehensive,
}

impl SummaryMode {
    pub const ALL: [SummaryMode; 3] = [
        SummaryMode::Concise,
        SummaryMode::Balanced,
        SummaryMode::Comprehensive,
    ];

    /// Identifier shown to the user and stored in config files.
    pub fn id(self) -> &'static str {
        match self {
            SummaryMode::Concise => "concise",
            SummaryMode::Balanced => "balanced",
            SummaryMode::Comprehensive => "comprehensive",
        }
    }

    /// Value sent to the backend as `summary_type`.
    pub fn summary_type(self) -> &'static str {
        match self {
            SummaryMode::Concise => "concise",
            SummaryMode::Balanced => "detailed",
            SummaryMode::Comprehensive => "bullet_points",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SummaryMode::Concise => "Concise",
            SummaryMode::Balanced => "Balanced",
            SummaryMode::Comprehensive => "Comprehensive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SummaryMode::Concise => "Short, point-based summary",
            SummaryMode::Balanced => "Detailed but readable",
            SummaryMode::Comprehensive => "In-depth analysis",
        }
    }

    /// Position in [`SummaryMode::ALL`].
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown summary mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for SummaryMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(SummaryMode::Concise),
            "balanced" | "detailed" => Ok(SummaryMode::Balanced),
            "comprehensive" | "bullet_points" => Ok(SummaryMode::Comprehensive),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Body of `POST /api/summarize`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRequest {
    pub text: String,
    pub summary_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>, mode: SummaryMode, max_length: Option<u32>) -> Self {
        Self {
            text: text.into(),
            summary_type: mode.summary_type().to_string(),
            max_length,
        }
    }
}

/// A generated summary and its metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
    /// Character count of the source text
    pub original_length: u64,
    /// Character count of the summary
    pub summary_length: u64,
    /// `summary_length / original_length`, rounded by the server
    pub compression_ratio: f64,
    pub timestamp: NaiveDateTime,
}

impl SummaryResponse {
    /// Compression ratio expressed as a percentage of the original.
    pub fn compression_percent(&self) -> f64 {
        self.compression_ratio * 100.0
    }

    /// `1000 → 100 chars · 10.0% of original · 2024-05-01 12:30`
    pub fn metrics_line(&self) -> String {
        format!(
            "{} → {} chars · {:.1}% of original · {}",
            self.original_length,
            self.summary_length,
            self.compression_percent(),
            self.timestamp.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Result of `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentUploadResponse {
    pub filename: String,
    pub file_size: u64,
    pub extracted_text: String,
    pub text_length: u64,
    pub message: String,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Error body returned with non-2xx statuses.
///
/// FastAPI validation failures put a structured list in `detail`, so it is
/// kept as raw JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best-effort human message: `detail`, then `error`.
    pub fn message(&self) -> Option<String> {
        let detail = match &self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(serde_json::Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
        };
        detail.or_else(|| self.error.clone().filter(|e| !e.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_display_and_wire_names() {
        assert_eq!("concise".parse(), Ok(SummaryMode::Concise));
        assert_eq!("Balanced".parse(), Ok(SummaryMode::Balanced));
        assert_eq!("detailed".parse(), Ok(SummaryMode::Balanced));
        assert_eq!("bullet_points".parse(), Ok(SummaryMode::Comprehensive));
        assert!("verbose".parse::<SummaryMode>().is_err());
    }

    #[test]
    fn default_mode_is_balanced() {
        assert_eq!(SummaryMode::default(), SummaryMode::Balanced);
        assert_eq!(SummaryMode::Balanced.summary_type(), "detailed");
    }

    #[test]
    fn request_omits_missing_max_length() {
        let req = SummaryRequest::new("hello", SummaryMode::Concise, None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "hello", "summary_type": "concise"})
        );

        let req = SummaryRequest::new("hello", SummaryMode::Comprehensive, Some(200));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_length"], 200);
        assert_eq!(json["summary_type"], "bullet_points");
    }

    #[test]
    fn response_accepts_naive_timestamp() {
        let body = r#"{
            "summary": "X",
            "original_length": 1000,
            "summary_length": 100,
            "compression_ratio": 0.1,
            "timestamp": "2024-05-01T12:30:45.123456"
        }"#;
        let resp: SummaryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.summary, "X");
        assert!((resp.compression_percent() - 10.0).abs() < 1e-9);
        assert_eq!(
            resp.metrics_line(),
            "1000 → 100 chars · 10.0% of original · 2024-05-01 12:30"
        );
    }

    #[test]
    fn error_body_prefers_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "bad", "detail": "File too large"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("File too large"));

        let body: ErrorBody = serde_json::from_str(r#"{"error": "bad"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("bad"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": [{"loc": ["body", "text"], "msg": "field required"}]}"#)
                .unwrap();
        let msg = body.message().unwrap();
        assert!(msg.contains("field required"));
    }
}
