mod common;

use common::TestSink;
use extractor_engine::{ClientSettings, FailureKind, JobClient, JobEvent, JobRequest};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_stream(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/job"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;
    server
}

fn client() -> JobClient {
    JobClient::new(ClientSettings::default()).unwrap()
}

fn request(server: &MockServer) -> JobRequest {
    JobRequest::stream(
        format!("{}/webhook/job", server.uri()),
        json!({ "job": "crawl https://example.com" }),
    )
}

fn appended(events: &[JobEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            JobEvent::ContentAppended { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn items_are_appended_in_order_then_completed() {
    engine_logging::initialize_for_tests();
    let server = serve_stream(concat!(
        "{\"type\":\"item\",\"content\":\"A\"}\n",
        "{\"type\":\"item\",\"content\":\"B\"}\n"
    ))
    .await;
    let sink = TestSink::new();

    let outcome = client()
        .run_streaming(&request(&server), &sink, &CancellationToken::new())
        .await
        .expect("stream ok");

    assert_eq!(outcome.final_text, "AB");
    assert_eq!(outcome.result_count, None);
    assert_eq!(
        sink.take(),
        vec![
            JobEvent::ContentAppended { text: "A".into() },
            JobEvent::ContentAppended { text: "B".into() },
            JobEvent::JobCompleted {
                final_text: "AB".into()
            },
        ]
    );
}

#[tokio::test]
async fn unterminated_last_line_is_flushed_before_completion() {
    let server = serve_stream(concat!(
        "{\"type\":\"item\",\"content\":\"A\"}\n",
        "{\"type\":\"item\",\"content\":\"C\"}"
    ))
    .await;
    let sink = TestSink::new();

    client()
        .run_streaming(&request(&server), &sink, &CancellationToken::new())
        .await
        .unwrap();

    let events = sink.take();
    assert_eq!(appended(&events), vec!["A", "C"]);
    assert_eq!(
        events.last(),
        Some(&JobEvent::JobCompleted {
            final_text: "AC".into()
        })
    );
}

#[tokio::test]
async fn malformed_and_foreign_lines_are_skipped() {
    let server = serve_stream(concat!(
        "not-json\n",
        "{\"type\":\"other\",\"content\":\"X\"}\n",
        "{\"type\":\"item\",\"content\":\"\"}\n",
        "{\"type\":\"item\",\"content\":\"kept\"}\n"
    ))
    .await;
    let sink = TestSink::new();

    let outcome = client()
        .run_streaming(&request(&server), &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.final_text, "kept");
    let events = sink.take();
    assert_eq!(appended(&events), vec!["kept"]);
    assert!(!events.iter().any(|event| matches!(
        event,
        JobEvent::ContentAppended { text } if text == "X" || text.contains("not-json")
    )));
}

#[tokio::test]
async fn empty_body_completes_with_empty_text() {
    let server = serve_stream("").await;
    let sink = TestSink::new();

    client()
        .run_streaming(&request(&server), &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        sink.take(),
        vec![JobEvent::JobCompleted {
            final_text: String::new()
        }]
    );
}

#[tokio::test]
async fn payload_is_posted_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/maps"))
        .and(body_json(json!({ "message": "best pharmacies in Sabha" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{\"type\":\"item\",\"content\":\"ok\"}\n", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = JobRequest::stream(
        format!("{}/webhook/maps", server.uri()),
        json!({ "message": "best pharmacies in Sabha" }),
    );
    let outcome = client()
        .run(&request, &TestSink::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.final_text, "ok");
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/job"))
        .respond_with(ResponseTemplate::new(500).set_body_string("workflow crashed"))
        .mount(&server)
        .await;
    let sink = TestSink::new();

    let err = client()
        .run_streaming(&request(&server), &sink, &CancellationToken::new())
        .await
        .unwrap_err();

    let expected = FailureKind::ServerError {
        status: 500,
        body: "workflow crashed".into(),
    };
    assert_eq!(err, expected);
    assert_eq!(sink.take(), vec![JobEvent::JobFailed { reason: expected }]);
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/webhook/job", listener.local_addr().unwrap());
    drop(listener);
    let sink = TestSink::new();

    let err = client()
        .run_streaming(
            &JobRequest::stream(endpoint, json!({ "job": "x" })),
            &sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, FailureKind::Connection);
    assert_eq!(
        sink.take(),
        vec![JobEvent::JobFailed {
            reason: FailureKind::Connection
        }]
    );
}

#[tokio::test]
async fn invalid_endpoint_fails_without_a_request() {
    let sink = TestSink::new();
    let err = client()
        .run_streaming(
            &JobRequest::stream("webhook", json!({})),
            &sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn cancelled_token_stops_the_job() {
    let server = serve_stream("{\"type\":\"item\",\"content\":\"A\"}\n").await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = TestSink::new();

    let err = client()
        .run_streaming(&request(&server), &sink, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, FailureKind::Cancelled);
    assert_eq!(
        sink.take(),
        vec![JobEvent::JobFailed {
            reason: FailureKind::Cancelled
        }]
    );
}
