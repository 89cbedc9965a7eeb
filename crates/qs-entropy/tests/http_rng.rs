//! External QRNG client against a local HTTP stub

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use qs_entropy::{
    EntropyError, ExternalHttpRng, LocalSampler, QrngConfig, RandomSource, RetryPolicy, SourceKind,
    TripleSource,
};
use qs_slot::{Symbol, Triple};

/// Serve one canned response per connection, returning the raw requests seen
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/API/jsonI.php", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            requests.push(String::from_utf8_lossy(&buf[..n]).into_owned());

            let reply = format!(
                "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        requests
    });

    (endpoint, handle)
}

fn client(endpoint: String, retry: RetryPolicy) -> ExternalHttpRng {
    ExternalHttpRng::new(QrngConfig {
        endpoint,
        timeout_ms: 2_000,
        retry,
    })
    .unwrap()
}

fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        multiplier: 1.0,
        max_backoff_ms: 1,
    }
}

#[tokio::test]
async fn test_fetches_and_decodes_three_bytes() {
    let (endpoint, server) = serve(vec![(
        200,
        r#"{"type":"string","length":3,"size":1,"data":["e4","1f","90"],"success":true}"#,
    )])
    .await;
    let rng = client(endpoint, RetryPolicy::none());

    assert_eq!(rng.kind(), SourceKind::ExternalRng);
    assert_eq!(rng.draw(3).await.unwrap(), vec![7, 0, 4]);

    let requests = server.await.unwrap();
    let request_line = requests[0].lines().next().unwrap_or_default();
    assert!(request_line.starts_with("GET /API/jsonI.php?"), "{}", request_line);
    assert!(request_line.contains("type=hex16"));
    assert!(request_line.contains("length=3"));
    assert!(request_line.contains("size=1"));
}

#[tokio::test]
async fn test_malformed_payload_is_a_decode_error() {
    let (endpoint, _server) = serve(vec![(200, r#"{"data":["zz","00","00"]}"#)]).await;
    let rng = client(endpoint, RetryPolicy::none());

    assert!(matches!(rng.draw(3).await, Err(EntropyError::Decode(_))));
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let (endpoint, _server) = serve(vec![(200, "<html>maintenance</html>")]).await;
    let rng = client(endpoint, RetryPolicy::none());

    assert!(matches!(rng.draw(3).await, Err(EntropyError::Decode(_))));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (endpoint, server) = serve(vec![
        (503, r#"{"success":false}"#),
        (200, r#"{"data":["20","40","60"],"success":true}"#),
    ])
    .await;
    let rng = client(endpoint, quick_retry(2));

    assert_eq!(rng.draw(3).await.unwrap(), vec![1, 2, 3]);
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_server_error_without_retry_is_a_network_error() {
    let (endpoint, _server) = serve(vec![(500, "{}")]).await;
    let rng = client(endpoint, RetryPolicy::none());

    let err = rng.draw(3).await.unwrap_err();
    assert!(matches!(err, EntropyError::Network(_)), "{:?}", err);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_triple_from_external_provider() {
    let (endpoint, _server) = serve(vec![(200, r#"{"data":["ff","ff","ff"],"success":true}"#)]).await;
    let source = TripleSource::builder(LocalSampler::seeded(3))
        .provider(std::sync::Arc::new(client(endpoint, RetryPolicy::none())))
        .build();

    let triple = source.next_triple_for("external-rng").await.unwrap();
    assert_eq!(triple, Triple::new(Symbol::Seven, Symbol::Seven, Symbol::Seven));
}
