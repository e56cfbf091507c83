use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{
    get_opt_f64, get_opt_i64, get_opt_str, get_required_i64, get_required_str, require_subject,
    require_workspace,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{FinalExam, Group, HomeWorkCategory, Subject, Teacher};
use crate::workspace;
use chrono::NaiveDateTime;
use serde_json::{json, Value};

fn subject_summary(subject: &Subject) -> Value {
    json!({
        "number": subject.number,
        "name": subject.name,
        "year": subject.year,
        "finishedActions": subject.progress,
        "counts": {
            "students": subject.students.len(),
            "teachers": subject.teachers.len(),
            "homeworkCategories": subject.home_work_categories.len(),
            "homeworks": subject.home_works().count(),
            "tests": subject.tests.len(),
            "finalExams": subject.final_exams.len(),
        }
    })
}

fn handle_subject_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let number = get_required_str(&req.params, "number")?;
    let name = get_required_str(&req.params, "name")?;
    let year = get_required_str(&req.params, "year")?;
    let subject = Subject::new(number, name, year);
    let summary = subject_summary(&subject);
    state.subject = Some(subject);
    state.grade_items.clear();
    Ok(summary)
}

fn handle_subject_get(state: &mut AppState) -> Result<Value, HandlerErr> {
    Ok(subject_summary(require_subject(state)?))
}

fn handle_subject_save(state: &mut AppState) -> Result<Value, HandlerErr> {
    let workspace_path = require_workspace(state)?;
    let subject = require_subject(state)?;
    let path = workspace::save_subject(&workspace_path, subject)
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
    Ok(json!({ "path": path.to_string_lossy() }))
}

fn handle_subject_close(state: &mut AppState) -> Result<Value, HandlerErr> {
    let closed = state.subject.take().is_some();
    state.grade_items.clear();
    Ok(json!({ "closed": closed }))
}

fn handle_teachers_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let mut groups = Vec::new();
    if let Some(raw) = req.params.get("groups") {
        let Some(items) = raw.as_array() else {
            return Err(HandlerErr::bad_params("groups must be an array"));
        };
        for g in items {
            groups.push(Group {
                number: get_opt_str(g, "number"),
                remote_id: get_opt_i64(g, "remoteId"),
                remote_name: get_opt_str(g, "remoteName"),
            });
        }
    }
    let teacher = Teacher {
        name: get_opt_str(&req.params, "name"),
        surname: get_opt_str(&req.params, "surname"),
        remote_id: get_opt_i64(&req.params, "remoteId"),
        remote_email: get_opt_str(&req.params, "remoteEmail"),
        taught_groups: groups,
    };
    let subject = require_subject(state)?;
    subject.add_teacher(teacher);
    Ok(json!({ "teacherCount": subject.teachers.len() }))
}

fn handle_final_exams_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let id = get_required_i64(&req.params, "id")?;
    let raw = get_required_str(&req.params, "dateTime")?;
    let date_time = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| HandlerErr::bad_params("dateTime must be YYYY-MM-DDTHH:MM[:SS]"))?;
    let room = get_opt_str(&req.params, "room");

    let subject = require_subject(state)?;
    if subject.final_exam_by_id(id).is_some() {
        return Err(HandlerErr::new("duplicate", format!("final exam {id} exists")));
    }
    if let Some(other) = subject.final_exam_by_date_time(date_time) {
        return Err(
            HandlerErr::new("duplicate", "another final exam has the same timestamp")
                .with_details(json!({ "finalExamId": other.id })),
        );
    }
    subject.add_final_exam(FinalExam {
        id,
        date_time,
        room,
        remote_id: None,
    });
    Ok(json!({ "finalExamId": id }))
}

fn handle_final_exams_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let subject = require_subject(state)?;
    let exams: Vec<Value> = subject
        .final_exams
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "dateTime": e.date_time.format("%Y-%m-%dT%H:%M").to_string(),
                "room": e.room,
                "remoteId": e.remote_id,
            })
        })
        .collect();
    Ok(json!({ "finalExams": exams }))
}

fn handle_home_work_categories_create(
    state: &mut AppState,
    req: &Request,
) -> Result<Value, HandlerErr> {
    let name = get_required_str(&req.params, "name")?;
    let max_points = get_opt_f64(&req.params, "maxPoints");
    let subject = require_subject(state)?;
    if subject.home_work_categories.iter().any(|c| c.name == name) {
        return Err(HandlerErr::new("duplicate", format!("category {name} exists")));
    }
    subject.home_work_categories.push(HomeWorkCategory {
        name,
        max_points,
        home_works: Vec::new(),
    });
    Ok(json!({ "categoryCount": subject.home_work_categories.len() }))
}

fn handle_tests_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let subject = require_subject(state)?;
    let tests: Vec<Value> = subject
        .tests
        .iter()
        .map(|t| json!({ "id": t.id, "name": t.name, "remoteId": t.remote_id }))
        .collect();
    Ok(json!({ "tests": tests }))
}

fn handle_home_works_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let subject = require_subject(state)?;
    let categories: Vec<Value> = subject
        .home_work_categories
        .iter()
        .map(|c| {
            let items: Vec<Value> = c
                .home_works
                .iter()
                .map(|h| {
                    json!({
                        "id": h.id,
                        "name": h.name,
                        "remoteId": h.remote_id,
                        "requiredPoints": h.required_points,
                    })
                })
                .collect();
            json!({ "name": c.name, "maxPoints": c.max_points, "homeworks": items })
        })
        .collect();
    Ok(json!({ "categories": categories }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "subject.create" => handle_subject_create(state, req),
        "subject.get" => handle_subject_get(state),
        "subject.save" => handle_subject_save(state),
        "subject.close" => handle_subject_close(state),
        "teachers.create" => handle_teachers_create(state, req),
        "finalExams.create" => handle_final_exams_create(state, req),
        "finalExams.list" => handle_final_exams_list(state),
        "homeworkCategories.create" => handle_home_work_categories_create(state, req),
        "tests.list" => handle_tests_list(state),
        "homeworks.list" => handle_home_works_list(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
