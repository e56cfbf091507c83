mod test_support;

use serde_json::json;
use test_support::{
    course_headers, error_code, request, request_ok, snapshot_driver, spawn_sidecar, temp_dir,
    write_course_snapshot, COURSE_URL,
};

#[test]
fn failed_sync_keeps_previous_subject_and_grade_items() {
    let workspace = temp_dir("gradesync-sync-rollback");
    let snapshot = workspace.join("snapshot");
    write_course_snapshot(&snapshot, &course_headers());

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "subject.create",
        json!({ "number": "I-ALG", "name": "Algebra", "year": "2023/2024" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "sync.run",
        json!({
            "actions": ["import.testList"],
            "courseUrl": COURSE_URL,
            "driver": snapshot_driver(&snapshot),
        }),
    );
    let tests_before = request_ok(&mut stdin, &mut reader, "4", "tests.list", json!({}));
    let subject_before = request_ok(&mut stdin, &mut reader, "5", "subject.get", json!({}));
    let saved_before = std::fs::read(workspace.join("subject.json")).expect("saved subject");

    // The report page drops out of the snapshot; the settings page is fine.
    std::fs::write(
        snapshot.join("pages.json"),
        json!({
            "pages": {
                "/course/view.php?id=12": "course.html",
                "/grade/edit/tree/index.php?id=12": "settings.html",
            }
        })
        .to_string(),
    )
    .expect("rewrite pages.json");

    let failed = request(
        &mut stdin,
        &mut reader,
        "6",
        "sync.run",
        json!({
            "actions": ["import.testList", "import.homeWorkList"],
            "courseUrl": COURSE_URL,
            "driver": snapshot_driver(&snapshot),
        }),
    );
    assert_eq!(failed.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&failed), Some("sync_failed"));
    assert_eq!(
        failed
            .pointer("/error/details/stage")
            .and_then(|v| v.as_str()),
        Some("navigated_to_settings")
    );

    let tests_after = request_ok(&mut stdin, &mut reader, "7", "tests.list", json!({}));
    let subject_after = request_ok(&mut stdin, &mut reader, "8", "subject.get", json!({}));
    assert_eq!(tests_before, tests_after);
    assert_eq!(subject_before, subject_after);
    let saved_after = std::fs::read(workspace.join("subject.json")).expect("saved subject");
    assert_eq!(saved_before, saved_after);

    let published = request_ok(&mut stdin, &mut reader, "9", "sync.gradeItems", json!({}));
    assert_eq!(
        published
            .get("gradeItems")
            .and_then(|v| v.as_array())
            .map(|v| v.len()),
        Some(6)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn missing_settings_link_fails_before_any_stage() {
    let workspace = temp_dir("gradesync-sync-no-settings");
    let snapshot = workspace.join("snapshot");
    write_course_snapshot(&snapshot, &course_headers());
    std::fs::write(
        snapshot.join("course.html"),
        "<html><body><a href=\"/course/edit.php?id=12\">Upraviť</a></body></html>",
    )
    .expect("rewrite course.html");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "subject.create",
        json!({ "number": "I-ALG", "name": "Algebra", "year": "2023/2024" }),
    );
    let failed = request(
        &mut stdin,
        &mut reader,
        "2",
        "sync.run",
        json!({
            "actions": ["import.testList"],
            "courseUrl": COURSE_URL,
            "driver": snapshot_driver(&snapshot),
        }),
    );
    assert_eq!(error_code(&failed), Some("sync_failed"));
    assert_eq!(
        failed
            .pointer("/error/details/stage")
            .and_then(|v| v.as_str()),
        Some("not_started")
    );
    let subject = request_ok(&mut stdin, &mut reader, "3", "subject.get", json!({}));
    assert_eq!(
        subject
            .get("finishedActions")
            .and_then(|v| v.as_array())
            .map(|v| v.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn sync_run_rejects_bad_requests() {
    let workspace = temp_dir("gradesync-sync-bad-params");
    let snapshot = workspace.join("snapshot");
    write_course_snapshot(&snapshot, &course_headers());

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let no_subject = request(
        &mut stdin,
        &mut reader,
        "1",
        "sync.run",
        json!({ "courseUrl": COURSE_URL, "driver": snapshot_driver(&snapshot) }),
    );
    assert_eq!(error_code(&no_subject), Some("no_subject"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "subject.create",
        json!({ "number": "I-ALG", "name": "Algebra", "year": "2023/2024" }),
    );

    let unknown_action = request(
        &mut stdin,
        &mut reader,
        "3",
        "sync.run",
        json!({
            "actions": ["import.gradeList"],
            "courseUrl": COURSE_URL,
            "driver": snapshot_driver(&snapshot),
        }),
    );
    assert_eq!(error_code(&unknown_action), Some("bad_params"));

    let live_driver = request(
        &mut stdin,
        &mut reader,
        "4",
        "sync.run",
        json!({
            "courseUrl": COURSE_URL,
            "driver": { "kind": "webdriver", "path": "http://localhost:4444" },
        }),
    );
    assert_eq!(error_code(&live_driver), Some("bad_params"));

    let no_url = request(
        &mut stdin,
        &mut reader,
        "5",
        "sync.run",
        json!({ "driver": snapshot_driver(&snapshot) }),
    );
    assert_eq!(error_code(&no_url), Some("bad_params"));

    let missing_snapshot = request(
        &mut stdin,
        &mut reader,
        "6",
        "sync.run",
        json!({
            "courseUrl": COURSE_URL,
            "driver": snapshot_driver(&workspace.join("nowhere")),
        }),
    );
    assert_eq!(error_code(&missing_snapshot), Some("sync_failed"));
    assert!(missing_snapshot
        .pointer("/error/details/stage")
        .map(|v| v.is_null())
        .unwrap_or(false));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
