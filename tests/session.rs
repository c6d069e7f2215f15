//! End-to-end controller flows against a mock service.

use serde_json::json;
use smartsum::app::{Action, App, Phase, QUERY_FAILED_ALERT};
use smartsum::{ApiClient, Document, SummaryMode};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn summary_body(summary: &str) -> serde_json::Value {
    json!({
        "summary": summary,
        "original_length": 5000,
        "summary_length": summary.len(),
        "compression_ratio": 0.002,
        "timestamp": "2024-05-01T09:15:00"
    })
}

fn report() -> Document {
    Document::new("report.pdf", b"%PDF-1.4".to_vec())
}

#[tokio::test]
async fn selecting_report_in_concise_mode_shows_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .and(query_param("summary_type", "concise"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("X")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut app = App::new(SummaryMode::Concise, None);
    app.settle(&client, Action::SelectFile(report())).await;

    assert_eq!(app.phase(), Phase::Ready);
    assert_eq!(app.summary(), Some("X"));
}

#[tokio::test]
async fn mode_change_requests_one_new_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .and(query_param("summary_type", "detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("balanced text")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .and(query_param("summary_type", "bullet_points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("- point")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut app = App::default();
    app.settle(&client, Action::SelectFile(report())).await;
    assert_eq!(app.summary(), Some("balanced text"));

    app.settle(&client, Action::ChangeMode(SummaryMode::Comprehensive))
        .await;
    assert_eq!(app.summary(), Some("- point"));
    assert_eq!(app.mode(), SummaryMode::Comprehensive);
}

#[tokio::test]
async fn question_is_answered_from_summary_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("Revenue grew 12%.")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .and(body_string_contains("Context: Revenue grew 12%.\\n\\nQuestion: By how much?"))
        .and(body_string_contains("\"summary_type\":\"concise\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("Twelve percent.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut app = App::default();
    app.settle(&client, Action::SelectFile(report())).await;
    app.settle(&client, Action::SubmitQuery("By how much?".into()))
        .await;

    assert_eq!(
        app.summary(),
        Some("Revenue grew 12%.\n\n**Q&A Response for \"By how much?\":**\nTwelve percent.")
    );
    assert!(!app.is_querying());
}

#[tokio::test]
async fn failed_summary_is_shown_inline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "File too large. Maximum size: 10.0MB"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut app = App::default();
    app.settle(&client, Action::SelectFile(report())).await;

    assert_eq!(
        app.summary(),
        Some("Error: File too large. Maximum size: 10.0MB")
    );
}

#[tokio::test]
async fn failed_question_alerts_and_keeps_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body("Summary.")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "model down"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut app = App::default();
    app.settle(&client, Action::SelectFile(report())).await;
    app.settle(&client, Action::SubmitQuery("Why?".into())).await;

    assert_eq!(app.alert(), Some(QUERY_FAILED_ALERT));
    assert_eq!(app.summary(), Some("Summary."));
}
