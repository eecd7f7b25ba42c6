use std::time::Duration;

use dashgate_api::GatewayConfig;
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(upstream_base: &str) -> Self {
        let config = GatewayConfig::new(Url::parse(upstream_base).unwrap());
        Self::spawn_with(config).await
    }

    async fn spawn_with(config: GatewayConfig) -> Self {
        dashgate_observability::init_for_tests();

        // Same router as prod, bound to an ephemeral port.
        let app = dashgate_api::build_app(config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn upstream_base(mock: &MockServer) -> String {
    format!("{}/v1", mock.uri())
}

/// A base URL nothing listens on.
async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

fn profile() -> Value {
    json!({
        "id": 7,
        "role_id": 2,
        "reference": "OP-7",
        "first_name": "Ada",
        "last_name": "Okafor",
        "email": "ada@example.com",
        "phone": null,
        "avatar": null,
        "push": false,
        "role": {"name": "Scheduler", "meta": ["view_events"]}
    })
}

fn set_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(reqwest::header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn health_does_not_need_upstream() {
    let srv = TestServer::spawn(&dead_upstream().await).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_issues_http_only_cookie_and_hides_token() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 200, "token": "abc", "user": profile()})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "ada@example.com", "password": "pw"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie(&res).expect("credential cookie");
    assert!(cookie.starts_with("dashboard_session=abc;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=777600"));

    let body: Value = res.json().await.unwrap();
    assert!(body.get("token").is_none());
    assert_eq!(body["user"]["email"], "ada@example.com");

    // Login is an unauthenticated upstream call.
    let received = upstream.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn failed_login_never_issues_a_cookie() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "x", "password": "y"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&res).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "Invalid credentials");
    assert_eq!(body["raw"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_falsy_success_flag_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Account locked", "token": "t"})),
        )
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&res).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Account locked");
}

#[tokio::test]
async fn login_without_token_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": profile()})))
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie(&res).is_none());
}

#[tokio::test]
async fn login_token_with_cookie_attributes_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "abc; Domain=evil.example", "user": profile()})),
        )
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie(&res).is_none());
    let body: Value = res.json().await.unwrap();
    assert!(!body.to_string().contains("evil.example"));
}

#[tokio::test]
async fn authenticated_read_forwards_bearer_and_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/events"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": [{"id": 1}]})))
        .expect(1)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .get(srv.url("/api/events?page=2"))
        .header("cookie", "theme=dark; dashboard_session=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-request-id").is_some());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "data": [{"id": 1}]}));
}

#[tokio::test]
async fn mutation_forwards_json_body_and_numeric_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/campaigns/42"))
        .and(body_json(json!({"name": "Spring"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": 42})))
        .expect(1)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .put(srv.url("/api/campaigns/42"))
        .header("cookie", "dashboard_session=abc")
        .json(&json!({"name": "Spring"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_numeric_id_is_rejected_locally() {
    let upstream = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .delete(srv.url("/api/users/abc"))
        .header("cookie", "dashboard_session=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid id");
}

#[tokio::test]
async fn missing_credential_still_reaches_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated"})))
        .expect(1)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::get(srv.url("/api/profile")).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Unauthenticated");

    let received = upstream.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn upstream_server_error_is_passed_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/screens/3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .get(srv.url("/api/screens/3"))
        .header("cookie", "dashboard_session=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": 500, "message": "boom", "raw": "boom"}));
}

#[tokio::test]
async fn domain_status_field_is_not_a_failure_flag() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/screens/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "status": 1})))
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .get(srv.url("/api/screens/3"))
        .header("cookie", "dashboard_session=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"id": 3, "status": 1}));
}

#[tokio::test]
async fn unreachable_upstream_is_503_for_every_operation() {
    let srv = TestServer::spawn(&dead_upstream().await).await;
    let client = reqwest::Client::new();

    let requests = vec![
        client.get(srv.url("/api/events")),
        client.post(srv.url("/api/auth/login")).json(&json!({"email": "a", "password": "b"})),
        client.delete(srv.url("/api/users/9")),
        client.post(srv.url("/api/auth/forgot-password")).json(&json!({"email": "a"})),
    ];

    for request in requests {
        let res = request.header("cookie", "dashboard_session=abc").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(set_cookie(&res).is_none());
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"status": 503, "message": "No response from Server"}));
    }
}

#[tokio::test]
async fn logout_rejects_get_and_revokes_on_post() {
    let srv = TestServer::spawn(&dead_upstream().await).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(set_cookie(&res).is_none());
    assert!(res.bytes().await.unwrap().is_empty());

    for _ in 0..2 {
        let res = client
            .post(srv.url("/api/auth/logout"))
            .header("cookie", "dashboard_session=abc")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = set_cookie(&res).expect("revocation cookie");
        assert!(cookie.starts_with("dashboard_session=;"));
        assert!(cookie.contains("Max-Age=-1"));
        assert!(res.bytes().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn download_without_url_is_400_and_fetches_nothing() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    for path in ["/api/download", "/api/download?url=", "/api/download?other=1"] {
        let res = reqwest::get(srv.url(path)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "URL is required");
    }
}

#[tokio::test]
async fn download_streams_file_as_attachment() {
    let files = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 fake".to_vec()),
        )
        .mount(&files)
        .await;

    let srv = TestServer::spawn(&dead_upstream().await).await;
    let file_url = format!("{}/files/report.pdf", files.uri());
    let res = reqwest::Client::new()
        .get(srv.url("/api/download"))
        .query(&[("url", file_url.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"report.pdf\""
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"%PDF-1.4 fake");
}

#[tokio::test]
async fn download_failure_is_500() {
    let files = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&files)
        .await;

    let srv = TestServer::spawn(&dead_upstream().await).await;
    let client = reqwest::Client::new();

    let missing = format!("{}/files/nope.txt", files.uri());
    let unreachable = format!("{}/file.txt", dead_upstream().await);
    for url in [missing.as_str(), unreachable.as_str(), "not a url"] {
        let res = client
            .get(srv.url("/api/download"))
            .query(&[("url", url)])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Failed to download file");
    }
}

/// Serves one response whose 30-byte body trickles out over about 3 seconds.
async fn slow_file_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 30\r\n\r\n")
            .await
            .unwrap();
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(300)).await;
            socket.write_all(b"abc").await.unwrap();
        }
        socket.flush().await.unwrap();
    });
    format!("http://{}/big.txt", addr)
}

#[tokio::test]
async fn download_outlasts_the_api_timeout_while_bytes_keep_flowing() {
    let mut config = GatewayConfig::new(Url::parse(&dead_upstream().await).unwrap());
    config.upstream_timeout = Duration::from_millis(1500);
    let srv = TestServer::spawn_with(config).await;

    let file_url = slow_file_server().await;
    let res = reqwest::Client::new()
        .get(srv.url("/api/download"))
        .query(&[("url", file_url.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.bytes().await.unwrap();
    assert_eq!(body.as_ref(), "abc".repeat(10).as_bytes());
}

#[tokio::test]
async fn media_upload_streams_raw_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/media"))
        .and(header("content-type", "application/octet-stream"))
        .and(header("authorization", "Bearer abc"))
        .and(body_bytes(b"\x00\x01raw-bytes".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "id": 5})))
        .expect(1)
        .mount(&upstream)
        .await;

    let srv = TestServer::spawn(&upstream_base(&upstream)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/media"))
        .header("cookie", "dashboard_session=abc")
        .header("content-type", "application/octet-stream")
        .body(b"\x00\x01raw-bytes".to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], 5);
}

#[tokio::test]
async fn rbac_catalog_is_served_locally() {
    let srv = TestServer::spawn(&dead_upstream().await).await;

    let body: Value = reqwest::get(srv.url("/api/rbac/permissions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names = body["permissions"].as_array().unwrap();
    assert!(names.iter().any(|p| p == "create_event"));

    let body: Value = reqwest::get(srv.url("/api/rbac/routes"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let routes = body["routes"].as_array().unwrap();
    assert!(routes
        .iter()
        .any(|r| r["path"] == "/events/create" && r["page_access_permission"] == "create_event"));
}
