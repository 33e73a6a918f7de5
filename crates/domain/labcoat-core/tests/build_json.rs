use labcoat_core::{Build, BuildRef, BuildStatus};

#[test]
fn job_payload_with_artifacts_parses() {
    let json = r#"
    {
      "id": 42,
      "status": "running",
      "stage": "test",
      "name": "rspec",
      "ref": "main",
      "created_at": "2016-01-11T10:13:33.506Z",
      "started_at": "2016-01-11T10:14:09.526Z",
      "finished_at": null,
      "artifacts_file": { "filename": "artifacts.zip", "size": 1000 },
      "coverage": null
    }
    "#;

    let build: Build = serde_json::from_str(json).expect("build should parse");
    assert_eq!(build.id, 42);
    assert_eq!(build.status, BuildStatus::Running);
    assert_eq!(build.ref_name, "main");
    assert!(build.started_at.is_some());
    assert!(build.finished_at.is_none());
    assert!(build.has_artifacts());
    assert_eq!(build.artifacts_file.unwrap().filename, "artifacts.zip");
}

#[test]
fn unknown_status_and_missing_fields_fall_back() {
    let build: Build =
        serde_json::from_str(r#"{ "id": 7, "status": "waiting_for_resource" }"#).unwrap();
    assert_eq!(build.status, BuildStatus::Unknown);
    assert!(!build.has_artifacts());
    assert!(!build.is_finished());
    assert!(build.name.is_empty());
}

#[test]
fn build_ref_displays_as_project_slash_build() {
    assert_eq!(BuildRef::new(7, 42).to_string(), "7/42");
}
