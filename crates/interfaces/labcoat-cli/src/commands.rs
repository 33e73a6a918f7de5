use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use labcoat_app_core::download::default_download_dir;
use labcoat_app_core::{
    ActionKind, ActionRequest, ArtifactDownloadImpl, BuildActionController, BusEvent,
    DownloadPort, EventBus, GitLabBuildService,
};
use labcoat_core::{Account, Build, BuildId, BuildRef, ProjectId};
use labcoat_infra::{DownloadEvent, DownloadResult, GitLabClient};

use crate::console::{ConsoleNotifier, SpinnerBusy};

fn api_client(account: &Account) -> Result<GitLabClient> {
    let client = labcoat_infra::default_http_client().context("Failed to build HTTP client")?;
    Ok(GitLabClient::new(client, account)?)
}

fn print_build(build: &Build) {
    println!("   Build:    #{} {}", build.id, build.name);
    println!("   Stage:    {}", build.stage);
    println!("   Ref:      {}", build.ref_name);
    println!("   Status:   {}", build.status);
    match &build.artifacts_file {
        Some(a) => println!(
            "   Artifacts: {} ({})",
            a.filename,
            format_size(a.size, DECIMAL)
        ),
        None => println!("   Artifacts: none"),
    }
}

pub async fn cmd_build_show(
    account: &Account,
    project_id: ProjectId,
    build_id: BuildId,
) -> Result<Build> {
    println!(":: Fetching build {}/{}", project_id, build_id);
    let build = api_client(account)?
        .get_build(project_id, build_id)
        .await
        .with_context(|| format!("Failed to fetch build {project_id}/{build_id}"))?;
    print_build(&build);
    Ok(build)
}

/// Run one action through the controller and report the new build state.
pub async fn cmd_build_action(
    account: &Account,
    kind: ActionKind,
    project_id: ProjectId,
    build_id: BuildId,
) -> Result<Build> {
    let target = BuildRef::new(project_id, build_id);
    let service = GitLabBuildService::for_account(account)?;
    let bus = EventBus::default();
    let mut updates = bus.subscribe();

    let busy = SpinnerBusy::new(format!("{} build {}...", kind, target));
    let mut controller = BuildActionController::new(service, ConsoleNotifier, busy, bus)?;

    controller.perform(ActionRequest::new(kind, target))?;
    controller.wait_for_outcome().await;

    match updates.try_next_for(&target) {
        Some(BusEvent::BuildChanged { build, .. }) => {
            print_build(&build);
            Ok(build)
        }
        // The notifier has already told the user; keep the error distinct.
        None => anyhow::bail!("{} of build {} failed", kind, target),
    }
}

pub async fn cmd_build_download(
    account: &Account,
    project_id: ProjectId,
    build_id: BuildId,
    output: Option<Utf8PathBuf>,
) -> Result<DownloadResult> {
    let client = labcoat_infra::default_http_client().context("Failed to build HTTP client")?;
    let api = GitLabClient::new(client.clone(), account)?;

    let build = api.get_build(project_id, build_id).await?;
    let artifacts = build
        .artifacts_file
        .ok_or_else(|| anyhow::anyhow!("No artifacts to download"))?;
    let url = api.artifacts_url(project_id, build_id)?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let downloads =
        ArtifactDownloadImpl::new(client, output.unwrap_or_else(default_download_dir))
            .with_progress(tx);
    let path = downloads.target_path(&artifacts.filename)?;

    println!(":: Downloading {} to {}", artifacts.filename, downloads.target_dir());
    tracing::debug!("Downloading build: {}", url);
    downloads.request_download(account, url.as_str(), &artifacts.filename)?;
    // The spawned download keeps its own sender; the channel closes when it ends.
    drop(downloads);

    let pb = ProgressBar::new(artifacts.size);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }

    let mut downloaded = 0u64;
    let mut success = false;
    while let Some(ev) = rx.recv().await {
        match ev {
            DownloadEvent::Started { total_bytes } => {
                downloaded = 0;
                pb.set_position(0);
                if let Some(total) = total_bytes {
                    pb.set_length(total);
                }
            }
            DownloadEvent::Progress { bytes_delta } => {
                downloaded = downloaded.saturating_add(bytes_delta);
                pb.set_position(downloaded);
            }
            DownloadEvent::Completed { success: ok } => {
                success = ok;
                break;
            }
        }
    }
    pb.finish_and_clear();

    if !success {
        anyhow::bail!("Download of {} failed", url);
    }
    println!(":: Saved {} ({})", path, format_size(downloaded, DECIMAL));
    Ok(DownloadResult {
        path,
        bytes_downloaded: downloaded,
    })
}
