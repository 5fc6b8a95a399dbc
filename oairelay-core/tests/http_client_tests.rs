//! End-to-end client tests against a mock HTTP server

use oairelay_core::providers::TransportErrorKind;
use oairelay_core::{
    AzureOpenAI, CallContext, ClientError, ClientOptions, ClientResult, OpenAI, ReqwestTransport,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Ack {
    ok: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("oairelay_core=debug")
        .try_init();
}

/// Options pointing at the mock server, with a short retry delay
fn test_options() -> ClientOptions {
    ClientOptions::new()
        .with_scheme("http")
        .with_timeout(Duration::from_secs(5))
        .with_retry_after(Duration::from_millis(10))
}

fn openai(server: &MockServer, options: ClientOptions) -> OpenAI {
    OpenAI::new(server.address().to_string(), "sk-test", options).unwrap()
}

#[tokio::test]
async fn test_chat_completion_success() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"model": "gpt-4o-mini", "messages": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options());
    let ack: Ack = client
        .create_chat_completion(
            &CallContext::new(),
            &json!({"model": "gpt-4o-mini", "messages": []}),
        )
        .await
        .unwrap();

    assert!(ack.ok);
}

#[tokio::test]
async fn test_rate_limit_surfaces_structured_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"message": "rate limited", "type": "requests"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options().with_max_retries(0));
    let result: ClientResult<Value> = client
        .create_text_embeddings(&CallContext::new(), &json!({"input": "hi"}))
        .await;

    match result.unwrap_err() {
        ClientError::Result(err) => {
            assert_eq!(err.status_code, 429);
            assert_eq!(err.message(), Some("rate limited"));
            assert_eq!(err.error_type(), Some("requests"));
            assert_eq!(err.retry_after, Some(Duration::from_millis(10)));
        }
        other => panic!("Expected result error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_retried_until_budget_spent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options().with_max_retries(2));
    let result: ClientResult<Value> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert!(err.retry_after().is_some());
    mock_server.verify().await;
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "bad model", "code": "model_not_found", "param": "model"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options());
    let result: ClientResult<Value> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    match result.unwrap_err() {
        ClientError::Result(err) => {
            assert_eq!(err.code(), Some("model_not_found"));
            assert_eq!(err.retry_after, None);
        }
        other => panic!("Expected result error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_error_body_keeps_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>not found</html>"))
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options());
    let result: ClientResult<Value> = client
        .create_text_embeddings(&CallContext::new(), &json!({}))
        .await;

    match result.unwrap_err() {
        ClientError::Result(err) => {
            assert_eq!(err.status_code, 404);
            assert!(err.detail.is_none());
        }
        other => panic!("Expected result error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ invalid json }"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = openai(&mock_server, test_options());
    let result: ClientResult<Ack> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    assert!(matches!(result, Err(ClientError::Decode { status: 200, .. })));
}

#[tokio::test]
async fn test_azure_deployment_path_and_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o-mini/chat/completions"))
        .and(query_param("api-version", "2024-06-01"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AzureOpenAI::new(
        mock_server.address().to_string(),
        "azure-key",
        "gpt-4o-mini",
        "2024-06-01",
        test_options(),
    )
    .unwrap();

    let ack: Ack = client
        .create_chat_completion(&CallContext::new(), &json!({"messages": []}))
        .await
        .unwrap();
    assert!(ack.ok);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_slow_response_times_out_and_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let options = test_options()
        .with_timeout(Duration::from_millis(100))
        .with_max_retries(1);
    let client = openai(&mock_server, options);

    let result: ClientResult<Ack> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    match result.unwrap_err() {
        ClientError::Transport { source, retry_after } => {
            assert!(source.is_timeout());
            assert!(retry_after.is_some());
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_during_wait_returns_promptly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = test_options().with_retry_after(Duration::from_secs(30));
    let client = openai(&mock_server, options);

    let ctx = CallContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let result: ClientResult<Value> = client.create_chat_completion(&ctx, &json!({})).await;

    assert!(result.unwrap_err().is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "pad": "0123456789"})),
        )
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap().with_max_response_size(8);
    let options = test_options()
        .with_max_retries(0)
        .with_transport(Arc::new(transport));
    let client = openai(&mock_server, options);

    let result: ClientResult<Ack> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    match result.unwrap_err() {
        ClientError::Transport { source, .. } => assert_eq!(source.kind, TransportErrorKind::Body),
        other => panic!("Expected transport error, got {:?}", other),
    }
}

/// Serves one chunked 200 response that never ends on its own
async fn endless_chunked_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 8192];
        let _ = socket.read(&mut request).await;

        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ntransfer-encoding: chunked\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        let chunk = format!("{:x}\r\n{}\r\n", 256, " ".repeat(256));
        while socket.write_all(chunk.as_bytes()).await.is_ok() {}
    });

    address
}

#[tokio::test]
async fn test_chunked_body_cut_off_at_size_cap() {
    let address = endless_chunked_server().await;

    let transport = ReqwestTransport::new().unwrap().with_max_response_size(4096);
    let options = test_options()
        .with_max_retries(0)
        .with_timeout(Duration::from_secs(10))
        .with_transport(Arc::new(transport));
    let client = OpenAI::new(address, "sk-test", options).unwrap();

    let started = Instant::now();
    let result: ClientResult<Ack> = client
        .create_chat_completion(&CallContext::new(), &json!({}))
        .await;

    match result.unwrap_err() {
        ClientError::Transport { source, .. } => assert_eq!(source.kind, TransportErrorKind::Body),
        other => panic!("Expected transport error, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}
