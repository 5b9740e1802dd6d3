//! Logged work sessions, bucketed by (month, year) for payroll.
//!
//! Rows freeze once the matching payroll record leaves Draft; the engine
//! rejects writes, not the schema.

use chrono::{Datelike, NaiveDate};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, contracts::PersonKind};

#[derive(Clone, Debug, PartialEq)]
pub struct WorkLog {
    pub id: Uuid,
    pub person_id: String,
    pub person_kind: PersonKind,
    pub date: NaiveDate,
    pub minutes: u32,
    pub group_id: Option<Uuid>,
    pub month: u32,
    pub year: i32,
}

impl WorkLog {
    pub fn new(
        person_id: String,
        person_kind: PersonKind,
        date: NaiveDate,
        minutes: u32,
        group_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if minutes == 0 {
            return Err(EngineError::InvalidInput(
                "minutes must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            person_id,
            person_kind,
            date,
            minutes,
            group_id,
            month: date.month(),
            year: date.year(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "work_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub person_id: String,
    pub person_kind: String,
    pub date: Date,
    pub minutes: i32,
    pub group_id: Option<String>,
    pub month: i32,
    pub year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WorkLog> for ActiveModel {
    fn from(log: &WorkLog) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            person_id: ActiveValue::Set(log.person_id.clone()),
            person_kind: ActiveValue::Set(log.person_kind.as_str().to_string()),
            date: ActiveValue::Set(log.date),
            minutes: ActiveValue::Set(log.minutes as i32),
            group_id: ActiveValue::Set(log.group_id.map(|id| id.to_string())),
            month: ActiveValue::Set(log.month as i32),
            year: ActiveValue::Set(log.year),
        }
    }
}

impl TryFrom<Model> for WorkLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("work log not exists".to_string()))?,
            person_id: model.person_id,
            person_kind: PersonKind::try_from(model.person_kind.as_str())?,
            date: model.date,
            minutes: model.minutes.max(0) as u32,
            group_id: model
                .group_id
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok()),
            month: model.month.max(0) as u32,
            year: model.year,
        })
    }
}
