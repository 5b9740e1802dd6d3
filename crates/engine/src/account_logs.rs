//! Append-only account ledger rows.
//!
//! A row is never updated or deleted; corrections are new compensating rows.
//! Charge rows carry a `period_key` (`"{group_id}:{YYYY-MM}"`) which is the
//! idempotency key for the monthly charge run.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    TopUp,
    Charge,
    Refund,
    Adjustment,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::Charge => "charge",
            Self::Refund => "refund",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for LogKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "top_up" => Ok(Self::TopUp),
            "charge" => Ok(Self::Charge),
            "refund" => Ok(Self::Refund),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidInput(format!(
                "invalid account log kind: {other}"
            ))),
        }
    }
}

/// Who performed a balance-changing operation, for the audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Performer {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountLog {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub kind: LogKind,
    pub note: Option<String>,
    pub performer_id: String,
    pub performer_name: String,
    pub group_id: Option<Uuid>,
    pub period_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountLog {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        amount_minor: i64,
        kind: LogKind,
        note: Option<String>,
        performer: &Performer,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount_minor,
            kind,
            note,
            performer_id: performer.id.clone(),
            performer_name: performer.name.clone(),
            group_id: None,
            period_key: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub amount_minor: i64,
    pub kind: String,
    pub note: Option<String>,
    pub performer_id: String,
    pub performer_name: String,
    pub group_id: Option<String>,
    pub period_key: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AccountLog> for ActiveModel {
    fn from(log: &AccountLog) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            account_id: ActiveValue::Set(log.account_id.to_string()),
            amount_minor: ActiveValue::Set(log.amount_minor),
            kind: ActiveValue::Set(log.kind.as_str().to_string()),
            note: ActiveValue::Set(log.note.clone()),
            performer_id: ActiveValue::Set(log.performer_id.clone()),
            performer_name: ActiveValue::Set(log.performer_name.clone()),
            group_id: ActiveValue::Set(log.group_id.map(|id| id.to_string())),
            period_key: ActiveValue::Set(log.period_key.clone()),
            created_at: ActiveValue::Set(log.created_at),
        }
    }
}

impl TryFrom<Model> for AccountLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account log not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            amount_minor: model.amount_minor,
            kind: LogKind::try_from(model.kind.as_str())?,
            note: model.note,
            performer_id: model.performer_id,
            performer_name: model.performer_name,
            group_id: model
                .group_id
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok()),
            period_key: model.period_key,
            created_at: model.created_at,
        })
    }
}
