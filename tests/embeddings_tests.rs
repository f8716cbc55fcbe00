//! Integration tests for embedding generation against a mock Ollama server.

use std::time::Duration;

use ollama_client::{
    EmbeddingGenerator, EmbeddingOptions, OllamaClient, OllamaError, PropertyValue,
    UsageDetails, KEEP_ALIVE_KEY, LOAD_DURATION_KEY, TOTAL_DURATION_KEY, TRUNCATE_KEY,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

fn client_for(server: &MockServer, default_model: Option<&str>) -> OllamaClient {
    let mut builder = OllamaClient::builder().endpoint(server.uri());
    if let Some(model) = default_model {
        builder = builder.default_model(model);
    }
    builder.build().expect("Failed to build client")
}

fn success_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn last_request_body(server: &MockServer) -> Value {
    let requests = server
        .received_requests()
        .await
        .expect("Request recording is enabled");
    requests
        .last()
        .expect("At least one request was received")
        .body_json()
        .expect("Request body is JSON")
}

#[tokio::test]
async fn test_embed_round_trip() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({ "model": "all-minilm", "input": ["a", "b"] })))
        .respond_with(success_response(json!({
            "model": "all-minilm",
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
            "prompt_eval_count": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("all-minilm"));
    let result = client
        .embeddings()
        .embed(["a", "b"], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.embeddings[0].vector, vec![0.1, 0.2, 0.3]);
    assert_eq!(result.embeddings[1].vector, vec![0.4, 0.5, 0.6]);
    assert!(result.iter().all(|e| e.model_id == "all-minilm"));
    assert_eq!(
        result.usage,
        Some(UsageDetails {
            input_token_count: 7,
            total_token_count: 7
        })
    );
    assert!(result.additional_properties.is_none());
}

#[tokio::test]
async fn test_embed_preserves_order() {
    let server = setup_mock_server().await;

    let vectors: Vec<Vec<f32>> = (0..8u8).map(|i| vec![f32::from(i), -f32::from(i)]).collect();
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": vectors })))
        .mount(&server)
        .await;

    let inputs: Vec<String> = (0..8).map(|i| format!("document {}", i)).collect();
    let result = client_for(&server, Some("m"))
        .embeddings()
        .generate(inputs.clone(), None, &CancellationToken::new())
        .await
        .unwrap();

    let returned: Vec<Vec<f32>> = result.into_iter().map(|e| e.vector).collect();
    assert_eq!(returned, vectors);
    assert_eq!(last_request_body(&server).await["input"], json!(inputs));
}

#[tokio::test]
async fn test_endpoint_with_base_path() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/ollama/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::builder()
        .endpoint(format!("{}/ollama", server.uri()))
        .default_model("m")
        .build()
        .unwrap();

    let result = client
        .embeddings()
        .embed(["x"], None, &CancellationToken::new())
        .await;

    assert!(result.is_ok());
}

#[test_case(Some("A"), Some("B"), "B" ; "override wins over default")]
#[test_case(Some("A"), None, "A" ; "default used without override")]
#[test_case(None, None, "" ; "empty model when neither is set")]
#[test_case(Some("A"), Some(""), "" ; "empty override wins over default")]
#[tokio::test]
async fn test_model_precedence(default_model: Option<&str>, override_model: Option<&str>, expected: &str) {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    let options = match override_model {
        Some(model) => EmbeddingOptions::new().with_model(model),
        None => EmbeddingOptions::new(),
    };

    client_for(&server, default_model)
        .embeddings()
        .embed(["t"], Some(&options), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(last_request_body(&server).await["model"], json!(expected));
}

#[test_case(PropertyValue::from(300), Some(json!(300)) ; "integer keep_alive")]
#[test_case(PropertyValue::from("600"), Some(json!(600)) ; "numeric text keep_alive")]
#[test_case(PropertyValue::from(true), Some(json!(1)) ; "boolean keep_alive")]
#[test_case(PropertyValue::from("five minutes"), None ; "non-numeric keep_alive dropped")]
#[test_case(PropertyValue::from(1.5), None ; "fractional keep_alive dropped")]
#[tokio::test]
async fn test_keep_alive_extraction(value: PropertyValue, expected: Option<Value>) {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    let options = EmbeddingOptions::new().with_property(KEEP_ALIVE_KEY, value);
    let result = client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], Some(&options), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(last_request_body(&server).await.get("keep_alive").cloned(), expected);
}

#[test_case(PropertyValue::from(false), Some(json!(false)) ; "boolean truncate")]
#[test_case(PropertyValue::from("TRUE"), Some(json!(true)) ; "text truncate")]
#[test_case(PropertyValue::from(0), Some(json!(false)) ; "integer truncate")]
#[test_case(PropertyValue::from("yes please"), None ; "unparseable truncate dropped")]
#[test_case(PropertyValue::from(Duration::from_secs(1)), None ; "duration truncate dropped")]
#[tokio::test]
async fn test_truncate_extraction(value: PropertyValue, expected: Option<Value>) {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    let options = EmbeddingOptions::new().with_property(TRUNCATE_KEY, value);
    client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], Some(&options), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(last_request_body(&server).await.get("truncate").cloned(), expected);
}

#[tokio::test]
async fn test_no_options_sends_minimal_body() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        last_request_body(&server).await,
        json!({ "model": "m", "input": ["t"] })
    );
}

#[tokio::test]
async fn test_extras_total_duration_only() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({
            "embeddings": [[1.0]],
            "total_duration": 1_000_000
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], None, &CancellationToken::new())
        .await
        .unwrap();

    let extras = result.additional_properties.expect("extras are present");
    assert_eq!(extras.len(), 1);
    assert_eq!(
        extras.get(TOTAL_DURATION_KEY),
        Some(&PropertyValue::Duration(Duration::from_millis(1)))
    );
    assert!(extras.get(LOAD_DURATION_KEY).is_none());
}

#[tokio::test]
async fn test_extras_absent_without_durations() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({
            "embeddings": [[1.0]],
            "prompt_eval_count": 2
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.additional_properties.is_none());
}

#[tokio::test]
async fn test_usage_absent_without_prompt_eval_count() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    let result = client_for(&server, Some("m"))
        .embeddings()
        .embed(["t"], None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.usage.is_none());
}

#[tokio::test]
async fn test_count_mismatch_is_protocol_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "embeddings": [[1.0], [2.0], [3.0]] })))
        .mount(&server)
        .await;

    let error = client_for(&server, Some("m"))
        .embeddings()
        .embed(["a", "b"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    match error {
        OllamaError::Protocol { message, .. } => {
            assert!(message.contains("3 embeddings but 2 were expected"));
        }
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_string_is_service_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({ "error": "input length exceeds context" })))
        .mount(&server)
        .await;

    let error = client_for(&server, Some("m"))
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, OllamaError::Service { .. }));
    assert!(error.to_string().contains("input length exceeds context"));
}

#[tokio::test]
async fn test_not_found_status_with_error_body() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "model \"ghost\" not found, try pulling it first" })),
        )
        .mount(&server)
        .await;

    let error = client_for(&server, Some("ghost"))
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    match error {
        OllamaError::Service { message, status } => {
            assert_eq!(message, "model \"ghost\" not found, try pulling it first");
            assert_eq!(status, Some(404));
        }
        other => panic!("Expected Service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_without_error_body() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let error = client_for(&server, Some("m"))
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(error.is_retryable());
    match error {
        OllamaError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_protocol_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let error = client_for(&server, Some("m"))
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, OllamaError::Protocol { source: Some(_), .. }));
}

#[tokio::test]
async fn test_cancellation_during_request() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            success_response(json!({ "embeddings": [[1.0]] })).set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let client = client_for(&server, Some("m"));
    let started = std::time::Instant::now();
    let error = client
        .embeddings()
        .embed(["a"], None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(error, OllamaError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            success_response(json!({ "embeddings": [[1.0]] })).set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::builder()
        .endpoint(server.uri())
        .default_model("m")
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let error = client
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, OllamaError::Transport { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = OllamaClient::builder()
        .endpoint("http://127.0.0.1:1")
        .default_model("m")
        .build()
        .unwrap();

    let error = client
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, OllamaError::Transport { .. }));
}

#[tokio::test]
async fn test_bearer_token_and_custom_headers() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(header("Authorization", "Bearer proxy-token"))
        .and(header("X-Tenant", "search"))
        .respond_with(success_response(json!({ "embeddings": [[1.0]] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::builder()
        .endpoint(server.uri())
        .default_model("m")
        .api_key("proxy-token")
        .header("X-Tenant", "search")
        .build()
        .unwrap();

    let result = client
        .embeddings()
        .embed(["a"], None, &CancellationToken::new())
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_empty_batch_is_sent() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_json(json!({ "model": "m", "input": [] })))
        .respond_with(success_response(json!({ "embeddings": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, Some("m"))
        .embeddings()
        .generate(Vec::new(), None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_metadata_reports_provider() {
    let server = setup_mock_server().await;
    let client = client_for(&server, Some("nomic-embed-text"));

    let metadata = client.embeddings().metadata();
    assert_eq!(metadata.provider_name, "ollama");
    assert_eq!(metadata.endpoint.as_str(), format!("{}/", server.uri()));
    assert_eq!(metadata.default_model.as_deref(), Some("nomic-embed-text"));
}

#[tokio::test]
async fn test_full_metadata_response() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(success_response(json!({
            "model": "all-minilm",
            "embeddings": [[0.010071029, -0.0017594862, 0.05007221]],
            "total_duration": 14_143_917,
            "load_duration": 1_019_500,
            "prompt_eval_count": 8
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .embeddings()
        .embed_one(
            "Why is the sky blue?",
            Some(&EmbeddingOptions::new().with_model("all-minilm")),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.model_id, "all-minilm");
    assert_eq!(result.dimensions(), 3);
}
