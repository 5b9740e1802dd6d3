//! Student wallet accounts.
//!
//! The stored balance is a materialized projection; the account log is the
//! source of truth. `recompute_balance` replays the log so the two can be
//! compared at any time.

use sea_orm::{ActiveValue, entity::prelude::*};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Canonical form of a human-readable account code: NFKC, trimmed,
/// uppercased. Lookups and uniqueness both go through this.
pub fn normalize_code(raw: &str) -> ResultEngine<String> {
    let code: String = raw.trim().nfkc().collect::<String>().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidInput(
            "account code must not be empty".to_string(),
        ));
    }
    Ok(code)
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudentAccount {
    pub id: Uuid,
    pub student_id: Uuid,
    pub code: String,
    pub balance_minor: i64,
    pub active: bool,
}

impl StudentAccount {
    pub fn new(student_id: Uuid, code: &str) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            code: normalize_code(code)?,
            balance_minor: 0,
            active: true,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub balance_minor: i64,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Students,
    #[sea_orm(has_many = "super::account_logs::Entity")]
    Logs,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::account_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&StudentAccount> for ActiveModel {
    fn from(account: &StudentAccount) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            student_id: ActiveValue::Set(account.student_id.to_string()),
            code: ActiveValue::Set(account.code.clone()),
            balance_minor: ActiveValue::Set(account.balance_minor),
            active: ActiveValue::Set(account.active),
        }
    }
}

impl TryFrom<Model> for StudentAccount {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            student_id: Uuid::parse_str(&model.student_id)
                .map_err(|_| EngineError::KeyNotFound("student not exists".to_string()))?,
            code: model.code,
            balance_minor: model.balance_minor,
            active: model.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  st-0042 ").unwrap(), "ST-0042");
        assert!(normalize_code("   ").is_err());
    }

    #[test]
    fn normalize_folds_fullwidth_digits() {
        // NFKC folds fullwidth forms to ASCII.
        assert_eq!(normalize_code("ｓｔ－００１").unwrap(), "ST-001");
    }
}
