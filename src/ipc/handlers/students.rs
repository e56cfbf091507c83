use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{
    get_opt_f64, get_opt_i64, get_opt_str, get_required_str, parse_target, require_subject,
    require_workspace,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{PointsTarget, Student};
use crate::workspace;
use serde_json::{json, Value};
use std::path::PathBuf;

fn handle_students_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let number = get_required_str(&req.params, "number")?;
    let mut student = Student::new(
        number.clone(),
        get_required_str(&req.params, "name")?,
        get_required_str(&req.params, "surname")?,
        get_opt_str(&req.params, "group").unwrap_or_default(),
    );
    student.remote_id = get_opt_i64(&req.params, "remoteId");
    student.remote_group_id = get_opt_i64(&req.params, "remoteGroupId");
    student.remote_email = get_opt_str(&req.params, "remoteEmail");

    let subject = require_subject(state)?;
    if subject.students.iter().any(|s| s.number == number) {
        return Err(HandlerErr::new(
            "duplicate",
            format!("student {number} exists"),
        ));
    }
    subject.add_student(student);
    Ok(json!({ "studentNumber": number }))
}

fn handle_students_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let subject: &_ = require_subject(state)?;
    let students: Vec<Value> = subject
        .students
        .iter()
        .map(|s| {
            let group = subject.remote_group_of(s);
            json!({
                "number": s.number,
                "name": s.name,
                "surname": s.surname,
                "group": s.group,
                "remoteId": s.remote_id,
                "remoteGroupName": group.and_then(|g| g.remote_name.clone()),
                "gradeCount": s.grades.len(),
                "testPointCount": s.test_points.len(),
                "homeworkPointCount": s.home_work_points.len(),
            })
        })
        .collect();
    Ok(json!({ "students": students }))
}

fn target_json(target: PointsTarget) -> Value {
    match target {
        PointsTarget::Test(id) => json!({ "kind": "test", "id": id }),
        PointsTarget::HomeWork(id) => json!({ "kind": "homework", "id": id }),
        PointsTarget::FinalExam(id) => json!({ "kind": "finalExam", "id": id }),
    }
}

fn handle_students_set_points(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let number = get_required_str(&req.params, "number")?;
    let target = parse_target(&req.params)?;
    let points = get_opt_f64(&req.params, "points");

    let subject = require_subject(state)?;
    if !subject.target_exists(target) {
        return Err(HandlerErr::new("not_found", "target item not found")
            .with_details(target_json(target)));
    }
    let Some(student) = subject.student_by_number_mut(&number) else {
        return Err(HandlerErr::new("not_found", format!("student {number} not found")));
    };
    student.set_points(target, points);
    Ok(json!({ "studentNumber": number, "target": target_json(target), "points": points }))
}

fn handle_students_attach_file(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let number = get_required_str(&req.params, "number")?;
    let target = parse_target(&req.params)?;
    let src = PathBuf::from(get_required_str(&req.params, "path")?);
    let workspace_path = require_workspace(state)?;

    let subject = require_subject(state)?;
    if !subject.target_exists(target) {
        return Err(HandlerErr::new("not_found", "target item not found")
            .with_details(target_json(target)));
    }
    if !subject.students.iter().any(|s| s.number == number) {
        return Err(HandlerErr::new("not_found", format!("student {number} not found")));
    }
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "file not found")
            .with_details(json!({ "path": src.to_string_lossy() })));
    }

    let stored = workspace::store_attachment(&workspace_path, &src)
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
    let sha256 = stored.sha256.clone();
    if let Some(student) = subject.student_by_number_mut(&number) {
        student.add_file(target, stored);
    }
    Ok(json!({ "studentNumber": number, "sha256": sha256 }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.create" => handle_students_create(state, req),
        "students.list" => handle_students_list(state),
        "students.setPoints" => handle_students_set_points(state, req),
        "students.attachFile" => handle_students_attach_file(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
