//! Weekly journals.
//!
//! One journal per (group, week number); the attendance-and-grade sheet that
//! owns one entry per student per scheduled lesson slot.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Journal {
    pub id: Uuid,
    pub group_id: Uuid,
    pub week_number: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl Journal {
    #[must_use]
    pub fn new(group_id: Uuid, week_number: u32, week_start: NaiveDate, week_end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            week_number,
            week_start,
            week_end,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub week_number: i32,
    pub week_start: Date,
    pub week_end: Date,
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
    #[sea_orm(has_many = "super::journal_entries::Entity")]
    Entries,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Journal> for ActiveModel {
    fn from(journal: &Journal) -> Self {
        Self {
            id: ActiveValue::Set(journal.id.to_string()),
            group_id: ActiveValue::Set(journal.group_id.to_string()),
            week_number: ActiveValue::Set(journal.week_number as i32),
            week_start: ActiveValue::Set(journal.week_start),
            week_end: ActiveValue::Set(journal.week_end),
        }
    }
}

impl TryFrom<Model> for Journal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("journal not exists".to_string()))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::KeyNotFound("group not exists".to_string()))?,
            week_number: model.week_number.max(0) as u32,
            week_start: model.week_start,
            week_end: model.week_end,
        })
    }
}
