//! Lesson occurrences.
//!
//! One row per (group, week, day). Rows are created by the progression
//! engine and never hard-deleted, only soft-marked.

use chrono::{NaiveDate, NaiveTime};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Lesson {
    pub id: Uuid,
    pub group_id: Uuid,
    pub week: u32,
    pub day: u32,
    pub date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub deleted: bool,
}

impl Lesson {
    #[must_use]
    pub fn new(
        group_id: Uuid,
        week: u32,
        day: u32,
        date: NaiveDate,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            week,
            day,
            date,
            starts_at,
            ends_at,
            deleted: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub week: i32,
    pub day: i32,
    pub date: Date,
    pub starts_at: Time,
    pub ends_at: Time,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Lesson> for ActiveModel {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: ActiveValue::Set(lesson.id.to_string()),
            group_id: ActiveValue::Set(lesson.group_id.to_string()),
            week: ActiveValue::Set(lesson.week as i32),
            day: ActiveValue::Set(lesson.day as i32),
            date: ActiveValue::Set(lesson.date),
            starts_at: ActiveValue::Set(lesson.starts_at),
            ends_at: ActiveValue::Set(lesson.ends_at),
            deleted: ActiveValue::Set(lesson.deleted),
        }
    }
}

impl TryFrom<Model> for Lesson {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("lesson not exists".to_string()))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::KeyNotFound("group not exists".to_string()))?,
            week: model.week.max(0) as u32,
            day: model.day.max(0) as u32,
            date: model.date,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            deleted: model.deleted,
        })
    }
}
