//! Cash advances against a future payroll record.
//!
//! Pending → Settled (consumed by exactly one payroll record) or Cancelled.
//! An advance settles whole or stays pending; there is no partial settlement.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, contracts::PersonKind, period::Period};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    Pending,
    Settled,
    Cancelled,
}

impl AdvanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for AdvanceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "settled" => Ok(Self::Settled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid advance status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Advance {
    pub id: Uuid,
    pub person_id: String,
    pub person_kind: PersonKind,
    pub center_id: String,
    pub amount_minor: i64,
    pub month: u32,
    pub year: i32,
    pub status: AdvanceStatus,
    pub settled_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

impl Advance {
    pub fn new(
        person_id: String,
        person_kind: PersonKind,
        center_id: String,
        amount_minor: i64,
        period: Period,
        granted_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidInput(
                "advance amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            person_id,
            person_kind,
            center_id,
            amount_minor,
            month: period.month(),
            year: period.year(),
            status: AdvanceStatus::Pending,
            settled_by: None,
            granted_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "advances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub person_id: String,
    pub person_kind: String,
    pub center_id: String,
    pub amount_minor: i64,
    pub month: i32,
    pub year: i32,
    pub status: String,
    pub settled_by: Option<String>,
    pub granted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Advance> for ActiveModel {
    fn from(advance: &Advance) -> Self {
        Self {
            id: ActiveValue::Set(advance.id.to_string()),
            person_id: ActiveValue::Set(advance.person_id.clone()),
            person_kind: ActiveValue::Set(advance.person_kind.as_str().to_string()),
            center_id: ActiveValue::Set(advance.center_id.clone()),
            amount_minor: ActiveValue::Set(advance.amount_minor),
            month: ActiveValue::Set(advance.month as i32),
            year: ActiveValue::Set(advance.year),
            status: ActiveValue::Set(advance.status.as_str().to_string()),
            settled_by: ActiveValue::Set(advance.settled_by.map(|id| id.to_string())),
            granted_at: ActiveValue::Set(advance.granted_at),
        }
    }
}

impl TryFrom<Model> for Advance {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("advance not exists".to_string()))?,
            person_id: model.person_id,
            person_kind: PersonKind::try_from(model.person_kind.as_str())?,
            center_id: model.center_id,
            amount_minor: model.amount_minor,
            month: model.month.max(0) as u32,
            year: model.year,
            status: AdvanceStatus::try_from(model.status.as_str())?,
            settled_by: model
                .settled_by
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok()),
            granted_at: model.granted_at,
        })
    }
}
