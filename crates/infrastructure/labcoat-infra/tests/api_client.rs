use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use labcoat_core::{Account, BuildStatus};
use labcoat_infra::{ApiError, GitLabClient};
use std::net::SocketAddr;

const TOKEN: &str = "s3cr3t";

fn job_json(id: u64, status: &str) -> String {
    format!(
        r#"{{ "id": {id}, "status": "{status}", "name": "rspec", "stage": "test", "ref": "main" }}"#
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("PRIVATE-TOKEN")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TOKEN)
}

async fn start_mock_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route(
            "/api/v4/projects/7/jobs/42",
            get(|headers: HeaderMap| async move {
                if authorized(&headers) {
                    (StatusCode::OK, job_json(42, "failed"))
                } else {
                    (StatusCode::UNAUTHORIZED, "401 Unauthorized".to_string())
                }
            }),
        )
        .route(
            "/api/v4/projects/7/jobs/42/retry",
            post(|headers: HeaderMap| async move {
                if authorized(&headers) {
                    (StatusCode::CREATED, job_json(43, "pending"))
                } else {
                    (StatusCode::UNAUTHORIZED, "401 Unauthorized".to_string())
                }
            }),
        )
        .route(
            "/api/v4/projects/7/jobs/42/cancel",
            post(|| async { (StatusCode::CREATED, job_json(42, "canceled")) }),
        )
        .route(
            "/api/v4/projects/7/jobs/42/erase",
            post(|| async { (StatusCode::FORBIDDEN, "403 Forbidden".to_string()) }),
        )
        .route(
            "/api/v4/projects/7/jobs/99/cancel",
            post(|| async { (StatusCode::OK, "<html>not json</html>".to_string()) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, handle)
}

fn client_for(addr: SocketAddr, token: &str) -> GitLabClient {
    let account = Account {
        server_url: format!("http://{addr}/"),
        private_token: token.to_string(),
        username: None,
    };
    let http = labcoat_infra::default_http_client().unwrap();
    GitLabClient::new(http, &account).unwrap()
}

#[tokio::test]
async fn build_actions_hit_job_endpoints_with_token() {
    let (addr, server) = start_mock_server().await;
    let api = client_for(addr, TOKEN);

    let build = api.get_build(7, 42).await.expect("get build");
    assert_eq!(build.status, BuildStatus::Failed);

    let retried = api.retry_build(7, 42).await.expect("retry");
    assert_eq!(retried.id, 43);
    assert_eq!(retried.status, BuildStatus::Pending);

    let canceled = api.cancel_build(7, 42).await.expect("cancel");
    assert_eq!(canceled.status, BuildStatus::Canceled);

    server.abort();
}

#[tokio::test]
async fn error_status_and_bad_bodies_surface_as_api_errors() {
    let (addr, server) = start_mock_server().await;

    let api = client_for(addr, TOKEN);
    match api.erase_build(7, 42).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "403 Forbidden");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    assert!(matches!(
        api.cancel_build(7, 99).await,
        Err(ApiError::Decode(_))
    ));

    let unauthorized = client_for(addr, "wrong");
    assert!(matches!(
        unauthorized.retry_build(7, 42).await,
        Err(ApiError::Status { status: 401, .. })
    ));

    server.abort();
}
