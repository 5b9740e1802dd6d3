//! Journal entries: one cell of the weekly sheet.
//!
//! The natural key is (journal, student, day, lesson number). Entries are
//! mutated only through explicit updates by mentors, never bulk-overwritten.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Unset,
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

impl TryFrom<&str> for AttendanceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "unset" => Ok(Self::Unset),
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            other => Err(EngineError::InvalidInput(format!(
                "invalid attendance status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    #[default]
    Regular,
    Exam,
}

impl LessonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Exam => "exam",
        }
    }
}

impl TryFrom<&str> for LessonKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "regular" => Ok(Self::Regular),
            "exam" => Ok(Self::Exam),
            other => Err(EngineError::InvalidInput(format!(
                "invalid lesson kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub student_id: Uuid,
    pub day: u32,
    pub lesson_number: u32,
    pub grade: Option<f64>,
    pub bonus: Option<f64>,
    pub attendance: AttendanceStatus,
    pub comment: Option<String>,
    pub comment_author_id: Option<String>,
    pub comment_author_name: Option<String>,
    pub kind: LessonKind,
}

impl JournalEntry {
    #[must_use]
    pub fn blank(journal_id: Uuid, student_id: Uuid, day: u32, lesson_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            journal_id,
            student_id,
            day,
            lesson_number,
            grade: None,
            bonus: None,
            attendance: AttendanceStatus::Unset,
            comment: None,
            comment_author_id: None,
            comment_author_name: None,
            kind: LessonKind::Regular,
        }
    }

    /// Grade + bonus, treating unset as 0.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.grade.unwrap_or(0.0) + self.bonus.unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub journal_id: String,
    pub student_id: String,
    pub day: i32,
    pub lesson_number: i32,
    pub grade: Option<f64>,
    pub bonus: Option<f64>,
    pub attendance: String,
    pub comment: Option<String>,
    pub comment_author_id: Option<String>,
    pub comment_author_name: Option<String>,
    pub kind: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journals::Entity",
        from = "Column::JournalId",
        to = "super::journals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Journals,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Students,
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalEntry> for ActiveModel {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            journal_id: ActiveValue::Set(entry.journal_id.to_string()),
            student_id: ActiveValue::Set(entry.student_id.to_string()),
            day: ActiveValue::Set(entry.day as i32),
            lesson_number: ActiveValue::Set(entry.lesson_number as i32),
            grade: ActiveValue::Set(entry.grade),
            bonus: ActiveValue::Set(entry.bonus),
            attendance: ActiveValue::Set(entry.attendance.as_str().to_string()),
            comment: ActiveValue::Set(entry.comment.clone()),
            comment_author_id: ActiveValue::Set(entry.comment_author_id.clone()),
            comment_author_name: ActiveValue::Set(entry.comment_author_name.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for JournalEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("journal entry not exists".to_string()))?,
            journal_id: Uuid::parse_str(&model.journal_id)
                .map_err(|_| EngineError::KeyNotFound("journal not exists".to_string()))?,
            student_id: Uuid::parse_str(&model.student_id)
                .map_err(|_| EngineError::KeyNotFound("student not exists".to_string()))?,
            day: model.day.max(0) as u32,
            lesson_number: model.lesson_number.max(0) as u32,
            grade: model.grade,
            bonus: model.bonus,
            attendance: AttendanceStatus::try_from(model.attendance.as_str())?,
            comment: model.comment,
            comment_author_id: model.comment_author_id,
            comment_author_name: model.comment_author_name,
            kind: LessonKind::try_from(model.kind.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_round_trips() {
        for status in [
            AttendanceStatus::Unset,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
        ] {
            assert_eq!(AttendanceStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(AttendanceStatus::try_from("sleeping").is_err());
    }

    #[test]
    fn total_treats_unset_as_zero() {
        let mut entry = JournalEntry::blank(Uuid::new_v4(), Uuid::new_v4(), 1, 1);
        assert_eq!(entry.total(), 0.0);
        entry.grade = Some(4.0);
        entry.bonus = Some(0.5);
        assert_eq!(entry.total(), 4.5);
    }
}
