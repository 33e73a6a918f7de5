mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use camino::Utf8PathBuf;
use common::Surface;
use labcoat_app_core::{
    ActionKind, ActionRequest, ArtifactDownloadImpl, BuildActionController, BusEvent, DownloadPort,
    EventBus, GitLabBuildService,
};
use labcoat_core::{Account, BuildRef, BuildStatus};
use labcoat_infra::{ArtifactDownloader, DownloadEvent};
use tokio::sync::mpsc;

const PAYLOAD: &[u8] = b"PK\x03\x04 fake zip bytes";

fn job_json(id: u64, status: &str) -> String {
    format!(
        r#"{{ "id": {id}, "status": "{status}", "name": "rspec", "stage": "test", "ref": "main" }}"#
    )
}

async fn start_mock_server() -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v4/projects/7/jobs/42/retry",
            post(|| async { (StatusCode::CREATED, job_json(43, "pending")) }),
        )
        .route(
            "/api/v4/projects/7/jobs/42/erase",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error".to_string(),
                )
            }),
        )
        .route(
            "/api/v4/projects/7/jobs/42/artifacts",
            get(|| async { PAYLOAD.to_vec() }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn account(addr: SocketAddr) -> Account {
    Account {
        server_url: format!("http://{addr}"),
        private_token: "t".into(),
        username: None,
    }
}

#[tokio::test]
async fn controller_drives_real_http_service() {
    let addr = start_mock_server().await;
    let service = GitLabBuildService::for_account(&account(addr)).unwrap();
    let surface = Surface::default();
    let bus = EventBus::default();
    let mut sub = bus.subscribe();
    let mut ctl =
        BuildActionController::new(service, surface.clone(), surface.clone(), bus).unwrap();
    let target = BuildRef::new(7, 42);

    ctl.perform(ActionRequest::new(ActionKind::Retry, target))
        .unwrap();
    assert_eq!(ctl.wait_for_outcome().await, Some(ActionKind::Retry));
    match sub.try_next_for(&target) {
        Some(BusEvent::BuildChanged { build, .. }) => {
            assert_eq!(build.id, 43);
            assert_eq!(build.status, BuildStatus::Pending);
        }
        other => panic!("expected BuildChanged, got {other:?}"),
    }

    ctl.perform(ActionRequest::new(ActionKind::Erase, target))
        .unwrap();
    ctl.wait_for_outcome().await;
    assert_eq!(sub.try_next(), None);

    assert_eq!(
        surface.notices(),
        vec!["Build started".to_string(), "Unable to erase build".to_string()]
    );
    assert_eq!(surface.busy_log(), vec![true, false, true, false]);
}

#[tokio::test]
async fn download_port_writes_archive_to_target_dir() {
    let addr = start_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let target_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let downloader = ArtifactDownloader::new(labcoat_infra::default_http_client().unwrap(), None)
        .with_attempts(1, Duration::ZERO);
    let downloads =
        ArtifactDownloadImpl::with_downloader(downloader, target_dir.clone()).with_progress(tx);
    let acct = account(addr);
    let url = labcoat_infra::artifacts_url(&acct, 7, 42).unwrap();

    downloads
        .request_download(&acct, url.as_str(), "artifacts.zip")
        .unwrap();

    let mut success = None;
    while let Some(ev) = rx.recv().await {
        if let DownloadEvent::Completed { success: ok } = ev {
            success = Some(ok);
            break;
        }
    }
    assert_eq!(success, Some(true));
    assert_eq!(
        std::fs::read(target_dir.join("artifacts.zip")).unwrap(),
        PAYLOAD
    );
}

#[tokio::test]
async fn download_port_rejects_unsafe_names() {
    let dir = tempfile::tempdir().unwrap();
    let target_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let downloads =
        ArtifactDownloadImpl::new(labcoat_infra::default_http_client().unwrap(), target_dir);
    let acct = Account {
        server_url: "http://127.0.0.1:1".into(),
        private_token: "t".into(),
        username: None,
    };

    assert!(downloads
        .request_download(&acct, "http://127.0.0.1:1/x", "../escape.zip")
        .is_err());
}
