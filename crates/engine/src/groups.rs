//! Academic groups.
//!
//! A group is a cohort with a fixed weekly rhythm: five teaching days
//! (day indices 1..=5), one or more lessons per day in a fixed time window,
//! and an exam closing each week. Lesson dates derive from the start date,
//! which doubles as the anchor of week 1 day 1.

use chrono::{Duration, NaiveDate, NaiveTime};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Teaching days per week. Day index 6 is the exam slot.
pub const TEACHING_DAYS: u32 = 5;
pub const EXAM_DAY_INDEX: u32 = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub mentor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_weeks: u32,
    pub lessons_per_day: u32,
    pub lesson_start: NaiveTime,
    pub lesson_end: NaiveTime,
    pub classroom: Option<String>,
    pub monthly_fee_minor: i64,
    pub current_week: u32,
    pub started: bool,
    pub archived: bool,
}

impl Group {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        mentor_id: String,
        start_date: NaiveDate,
        total_weeks: u32,
        lessons_per_day: u32,
        lesson_start: NaiveTime,
        lesson_end: NaiveTime,
        monthly_fee_minor: i64,
    ) -> ResultEngine<Self> {
        if total_weeks == 0 {
            return Err(EngineError::InvalidInput(
                "total_weeks must be > 0".to_string(),
            ));
        }
        if lessons_per_day == 0 {
            return Err(EngineError::InvalidInput(
                "lessons_per_day must be > 0".to_string(),
            ));
        }
        if lesson_end <= lesson_start {
            return Err(EngineError::InvalidInput(
                "lesson window must end after it starts".to_string(),
            ));
        }
        if monthly_fee_minor < 0 {
            return Err(EngineError::InvalidInput(
                "monthly_fee_minor must be >= 0".to_string(),
            ));
        }
        let end_date = start_date + Duration::days(i64::from(total_weeks) * 7 - 1);
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            mentor_id,
            start_date,
            end_date,
            total_weeks,
            lessons_per_day,
            lesson_start,
            lesson_end,
            classroom: None,
            monthly_fee_minor,
            current_week: 1,
            started: false,
            archived: false,
        })
    }

    /// Civil date of the (week, day) slot. The start date anchors week 1
    /// day 1; teaching days are consecutive within the week.
    #[must_use]
    pub fn slot_date(&self, week: u32, day: u32) -> NaiveDate {
        self.start_date + Duration::days(i64::from(week - 1) * 7 + i64::from(day - 1))
    }

    /// Start/end of the journal week window for `week_number`.
    #[must_use]
    pub fn week_window(&self, week_number: u32) -> (NaiveDate, NaiveDate) {
        let start = self.start_date + Duration::days(i64::from(week_number - 1) * 7);
        (start, start + Duration::days(6))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub mentor_id: String,
    pub start_date: Date,
    pub end_date: Date,
    pub total_weeks: i32,
    pub lessons_per_day: i32,
    pub lesson_start: Time,
    pub lesson_end: Time,
    pub classroom: Option<String>,
    pub monthly_fee_minor: i64,
    pub current_week: i32,
    pub started: bool,
    pub archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lessons::Entity")]
    Lessons,
    #[sea_orm(has_many = "super::exams::Entity")]
    Exams,
    #[sea_orm(has_many = "super::journals::Entity")]
    Journals,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::lessons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exams.def()
    }
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Group> for ActiveModel {
    fn from(group: &Group) -> Self {
        Self {
            id: ActiveValue::Set(group.id.to_string()),
            name: ActiveValue::Set(group.name.clone()),
            mentor_id: ActiveValue::Set(group.mentor_id.clone()),
            start_date: ActiveValue::Set(group.start_date),
            end_date: ActiveValue::Set(group.end_date),
            total_weeks: ActiveValue::Set(group.total_weeks as i32),
            lessons_per_day: ActiveValue::Set(group.lessons_per_day as i32),
            lesson_start: ActiveValue::Set(group.lesson_start),
            lesson_end: ActiveValue::Set(group.lesson_end),
            classroom: ActiveValue::Set(group.classroom.clone()),
            monthly_fee_minor: ActiveValue::Set(group.monthly_fee_minor),
            current_week: ActiveValue::Set(group.current_week as i32),
            started: ActiveValue::Set(group.started),
            archived: ActiveValue::Set(group.archived),
        }
    }
}

impl TryFrom<Model> for Group {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("group not exists".to_string()))?,
            name: model.name,
            mentor_id: model.mentor_id,
            start_date: model.start_date,
            end_date: model.end_date,
            total_weeks: model.total_weeks.max(0) as u32,
            lessons_per_day: model.lessons_per_day.max(0) as u32,
            lesson_start: model.lesson_start,
            lesson_end: model.lesson_end,
            classroom: model.classroom,
            monthly_fee_minor: model.monthly_fee_minor,
            current_week: model.current_week.max(0) as u32,
            started: model.started,
            archived: model.archived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group::new(
            "Rust 101".to_string(),
            "mentor-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), // a Monday
            12,
            1,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            50_000_00,
        )
        .unwrap()
    }

    #[test]
    fn slot_date_walks_weeks_and_days() {
        let g = group();
        assert_eq!(
            g.slot_date(1, 1),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert_eq!(
            g.slot_date(1, 5),
            NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()
        );
        assert_eq!(
            g.slot_date(2, 1),
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
    }

    #[test]
    fn week_window_spans_seven_days() {
        let g = group();
        let (start, end) = g.week_window(2);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn rejects_inverted_time_window() {
        let result = Group::new(
            "Broken".to_string(),
            "mentor-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            4,
            1,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            0,
        );
        assert!(result.is_err());
    }
}
