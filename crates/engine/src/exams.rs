//! Weekly exams.
//!
//! One row per (group, week), created by the progression engine when the
//! week's five teaching days are exhausted.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Exam {
    pub id: Uuid,
    pub group_id: Uuid,
    pub week: u32,
    pub date: NaiveDate,
}

impl Exam {
    #[must_use]
    pub fn new(group_id: Uuid, week: u32, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            week,
            date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub week: i32,
    pub date: Date,
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

impl From<&Exam> for ActiveModel {
    fn from(exam: &Exam) -> Self {
        Self {
            id: ActiveValue::Set(exam.id.to_string()),
            group_id: ActiveValue::Set(exam.group_id.to_string()),
            week: ActiveValue::Set(exam.week as i32),
            date: ActiveValue::Set(exam.date),
        }
    }
}

impl TryFrom<Model> for Exam {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("exam not exists".to_string()))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::KeyNotFound("group not exists".to_string()))?,
            week: model.week.max(0) as u32,
            date: model.date,
        })
    }
}
