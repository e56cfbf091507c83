use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_HOME_WORK_CATEGORY: &str = "Home works";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub number: String,
    pub name: String,
    pub year: String,
    #[serde(default)]
    pub progress: BTreeSet<String>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub home_work_categories: Vec<HomeWorkCategory>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub final_exams: Vec<FinalExam>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: i64,
    pub name: String,
    pub remote_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeWork {
    pub id: i64,
    pub name: String,
    pub remote_id: Option<i64>,
    #[serde(default)]
    pub required_points: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeWorkCategory {
    pub name: String,
    #[serde(default)]
    pub max_points: Option<f64>,
    #[serde(default)]
    pub home_works: Vec<HomeWork>,
}

/// A scheduled final exam. The timestamp is its natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalExam {
    pub id: i64,
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub room: Option<String>,
    pub remote_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub remote_id: Option<i64>,
    pub remote_email: Option<String>,
    #[serde(default)]
    pub taught_groups: Vec<Group>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub number: Option<String>,
    pub remote_id: Option<i64>,
    pub remote_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    FX,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_name: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrade {
    pub final_exam_id: i64,
    pub grade: Option<Grade>,
    pub points: Option<f64>,
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

/// Points for one test or homework, keyed by the item's business id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemPoints {
    pub item_id: i64,
    pub points: Option<f64>,
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub number: String,
    pub name: String,
    pub surname: String,
    pub group: String,
    pub remote_id: Option<i64>,
    pub remote_group_id: Option<i64>,
    pub remote_email: Option<String>,
    #[serde(default)]
    pub grades: Vec<StudentGrade>,
    #[serde(default)]
    pub home_work_points: Vec<ItemPoints>,
    #[serde(default)]
    pub test_points: Vec<ItemPoints>,
}

/// What a points record or attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsTarget {
    Test(i64),
    HomeWork(i64),
    FinalExam(i64),
}

impl Subject {
    pub fn new(number: impl Into<String>, name: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            year: year.into(),
            progress: BTreeSet::new(),
            students: Vec::new(),
            teachers: Vec::new(),
            home_work_categories: Vec::new(),
            tests: Vec::new(),
            final_exams: Vec::new(),
        }
    }

    pub fn finish_action(&mut self, tag: &str) {
        self.progress.insert(tag.to_string());
    }

    pub fn clear_tests(&mut self) {
        self.tests.clear();
    }

    pub fn add_test(&mut self, test: Test) {
        self.tests.push(test);
    }

    pub fn test_by_remote_id(&self, remote_id: i64) -> Option<&Test> {
        self.tests.iter().find(|t| t.remote_id == Some(remote_id))
    }

    pub fn test_by_id(&self, id: i64) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn clear_home_works(&mut self) {
        for category in self.home_work_categories.iter_mut() {
            category.home_works.clear();
        }
    }

    pub fn add_home_work_to_category(&mut self, home_work: HomeWork) {
        if self.home_work_categories.is_empty() {
            self.home_work_categories.push(HomeWorkCategory {
                name: DEFAULT_HOME_WORK_CATEGORY.to_string(),
                max_points: None,
                home_works: Vec::new(),
            });
        }
        self.home_work_categories[0].home_works.push(home_work);
    }

    pub fn home_works(&self) -> impl Iterator<Item = &HomeWork> {
        self.home_work_categories
            .iter()
            .flat_map(|c| c.home_works.iter())
    }

    pub fn home_work_by_remote_id(&self, remote_id: i64) -> Option<&HomeWork> {
        self.home_works().find(|h| h.remote_id == Some(remote_id))
    }

    pub fn home_work_by_id(&self, id: i64) -> Option<&HomeWork> {
        self.home_works().find(|h| h.id == id)
    }

    pub fn add_final_exam(&mut self, exam: FinalExam) {
        self.final_exams.push(exam);
    }

    pub fn final_exam_by_date_time(&self, date_time: NaiveDateTime) -> Option<&FinalExam> {
        self.final_exams.iter().find(|e| e.date_time == date_time)
    }

    pub fn final_exam_by_id(&self, id: i64) -> Option<&FinalExam> {
        self.final_exams.iter().find(|e| e.id == id)
    }

    /// Sets the remote id of the exam with `exam_id`, first releasing the
    /// remote id from any other exam that still carries it.
    pub fn assign_final_exam_remote_id(&mut self, exam_id: i64, remote_id: i64) -> bool {
        if self.final_exam_by_id(exam_id).is_none() {
            return false;
        }
        for exam in self.final_exams.iter_mut() {
            if exam.id == exam_id {
                exam.remote_id = Some(remote_id);
            } else if exam.remote_id == Some(remote_id) {
                exam.remote_id = None;
            }
        }
        true
    }

    pub fn add_student(&mut self, student: Student) {
        self.students.push(student);
    }

    pub fn student_by_number_mut(&mut self, number: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.number == number)
    }

    pub fn add_teacher(&mut self, teacher: Teacher) {
        self.teachers.push(teacher);
    }

    /// The teacher group a student belongs to on the remote side.
    pub fn remote_group_of(&self, student: &Student) -> Option<&Group> {
        let remote_group_id = student.remote_group_id?;
        self.teachers
            .iter()
            .flat_map(|t| t.taught_groups.iter())
            .find(|g| g.remote_id == Some(remote_group_id))
    }

    pub fn target_exists(&self, target: PointsTarget) -> bool {
        match target {
            PointsTarget::Test(id) => self.test_by_id(id).is_some(),
            PointsTarget::HomeWork(id) => self.home_work_by_id(id).is_some(),
            PointsTarget::FinalExam(id) => self.final_exam_by_id(id).is_some(),
        }
    }
}

impl Student {
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            surname: surname.into(),
            group: group.into(),
            remote_id: None,
            remote_group_id: None,
            remote_email: None,
            grades: Vec::new(),
            home_work_points: Vec::new(),
            test_points: Vec::new(),
        }
    }

    pub fn set_points(&mut self, target: PointsTarget, points: Option<f64>) {
        match target {
            PointsTarget::FinalExam(id) => self.grade_entry(id).points = points,
            PointsTarget::Test(id) => item_entry(&mut self.test_points, id).points = points,
            PointsTarget::HomeWork(id) => {
                item_entry(&mut self.home_work_points, id).points = points
            }
        }
    }

    pub fn add_file(&mut self, target: PointsTarget, file: StoredFile) {
        let files = match target {
            PointsTarget::FinalExam(id) => &mut self.grade_entry(id).files,
            PointsTarget::Test(id) => &mut item_entry(&mut self.test_points, id).files,
            PointsTarget::HomeWork(id) => &mut item_entry(&mut self.home_work_points, id).files,
        };
        if !files.iter().any(|f| f.sha256 == file.sha256 && f.file_name == file.file_name) {
            files.push(file);
        }
    }

    fn grade_entry(&mut self, final_exam_id: i64) -> &mut StudentGrade {
        let pos = match self
            .grades
            .iter()
            .position(|g| g.final_exam_id == final_exam_id)
        {
            Some(pos) => pos,
            None => {
                self.grades.push(StudentGrade {
                    final_exam_id,
                    grade: None,
                    points: None,
                    files: Vec::new(),
                });
                self.grades.len() - 1
            }
        };
        &mut self.grades[pos]
    }
}

fn item_entry(entries: &mut Vec<ItemPoints>, item_id: i64) -> &mut ItemPoints {
    let pos = match entries.iter().position(|p| p.item_id == item_id) {
        Some(pos) => pos,
        None => {
            entries.push(ItemPoints {
                item_id,
                points: None,
                files: Vec::new(),
            });
            entries.len() - 1
        }
    };
    &mut entries[pos]
}
