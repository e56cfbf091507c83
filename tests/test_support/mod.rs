#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const COURSE_URL: &str = "https://lms.example.sk/course/view.php?id=12";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradesyncd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradesyncd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(json!({}))
}

pub fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

/// Header cells as they appear on the detailed grade report.
pub fn header_link(href: &str, text: &str) -> String {
    format!(r#"<th><a class="gradeitemheader" href="{href}">{text}</a></th>"#)
}

pub fn header_plain(text: &str) -> String {
    format!(r#"<th><span class="gradeitemheader">{text}</span></th>"#)
}

/// Writes a three-page course snapshot: course page, grade settings, and
/// the detailed report holding `headers`.
pub fn write_course_snapshot(dir: &Path, headers: &[String]) {
    std::fs::create_dir_all(dir).expect("create snapshot dir");
    std::fs::write(
        dir.join("pages.json"),
        json!({
            "pages": {
                "/course/view.php?id=12": "course.html",
                "/grade/edit/tree/index.php?id=12": "settings.html",
                "/grade/report/grader/index.php?id=12": "report.html",
            }
        })
        .to_string(),
    )
    .expect("write pages.json");
    std::fs::write(
        dir.join("course.html"),
        r#"<html><body>
            <a href="/course/edit.php?id=12">Upraviť</a>
            <a href="https://lms.example.sk/grade/edit/tree/index.php?id=12">Nastavenie hodnotenia</a>
        </body></html>"#,
    )
    .expect("write course.html");
    std::fs::write(
        dir.join("settings.html"),
        r#"<html><body>
            <a href="/grade/report/grader/index.php?id=12">
                Výkaz používateľa
            </a>
        </body></html>"#,
    )
    .expect("write settings.html");
    std::fs::write(
        dir.join("report.html"),
        format!(
            "<html><body><table><tr>{}</tr></table></body></html>",
            headers.concat()
        ),
    )
    .expect("write report.html");
}

/// Headers of the usual course: one non-item column, two quizzes, a final
/// exam term, a homework assignment, and an exam term nobody scheduled.
pub fn course_headers() -> Vec<String> {
    vec![
        header_plain("Priezvisko"),
        header_link("/mod/quiz/view.php?id=55", "Frotest 1"),
        header_link("/mod/assign/view.php?id=7", "Záverečná skúška 15.01.24 9:30"),
        header_link("/mod/assign/view.php?id=9", "Zadanie 1"),
        header_link("/mod/quiz/view.php?id=56", "Frotest 2"),
        header_link("/mod/assign/view.php?id=8", "Záverečná skúška 20.01.24 9:30"),
    ]
}

pub fn snapshot_driver(dir: &Path) -> serde_json::Value {
    json!({ "kind": "snapshot", "path": dir.to_string_lossy() })
}
