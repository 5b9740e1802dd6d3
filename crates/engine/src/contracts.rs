//! Payroll contracts: effective-dated compensation terms.
//!
//! Any combination of the three components may be set (fixed amount, hourly
//! rate, percentage of attributable student payments). At most one active
//! contract per (person, center) at any instant; the engine enforces this on
//! creation, not the schema.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A contract belongs to exactly one kind of person.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonKind {
    Mentor,
    Employee,
}

impl PersonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mentor => "mentor",
            Self::Employee => "employee",
        }
    }
}

impl TryFrom<&str> for PersonKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mentor" => Ok(Self::Mentor),
            "employee" => Ok(Self::Employee),
            other => Err(EngineError::InvalidInput(format!(
                "invalid person kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PayrollContract {
    pub id: Uuid,
    pub person_id: String,
    pub person_kind: PersonKind,
    pub center_id: String,
    pub fixed_minor: i64,
    pub hourly_rate_minor: i64,
    /// Share of attributable student payments, in basis points (10000 = 100%).
    pub percentage_bp: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub active: bool,
}

impl PayrollContract {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        person_id: String,
        person_kind: PersonKind,
        center_id: String,
        fixed_minor: i64,
        hourly_rate_minor: i64,
        percentage_bp: i64,
        effective_from: NaiveDate,
        effective_to: Option<NaiveDate>,
    ) -> ResultEngine<Self> {
        if fixed_minor < 0 || hourly_rate_minor < 0 || percentage_bp < 0 {
            return Err(EngineError::InvalidInput(
                "contract components must be >= 0".to_string(),
            ));
        }
        if percentage_bp > 10_000 {
            return Err(EngineError::InvalidInput(
                "percentage_bp must be <= 10000".to_string(),
            ));
        }
        if fixed_minor == 0 && hourly_rate_minor == 0 && percentage_bp == 0 {
            return Err(EngineError::InvalidInput(
                "contract must have at least one component".to_string(),
            ));
        }
        if let Some(to) = effective_to
            && to < effective_from
        {
            return Err(EngineError::InvalidInput(
                "effective_to must not precede effective_from".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            person_id,
            person_kind,
            center_id,
            fixed_minor,
            hourly_rate_minor,
            percentage_bp,
            effective_from,
            effective_to,
            active: true,
        })
    }

    /// Whether the contract is in force at any point of `[from, to]`.
    #[must_use]
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.effective_from <= to && self.effective_to.is_none_or(|end| end >= from)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payroll_contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub person_id: String,
    pub person_kind: String,
    pub center_id: String,
    pub fixed_minor: i64,
    pub hourly_rate_minor: i64,
    pub percentage_bp: i64,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PayrollContract> for ActiveModel {
    fn from(contract: &PayrollContract) -> Self {
        Self {
            id: ActiveValue::Set(contract.id.to_string()),
            person_id: ActiveValue::Set(contract.person_id.clone()),
            person_kind: ActiveValue::Set(contract.person_kind.as_str().to_string()),
            center_id: ActiveValue::Set(contract.center_id.clone()),
            fixed_minor: ActiveValue::Set(contract.fixed_minor),
            hourly_rate_minor: ActiveValue::Set(contract.hourly_rate_minor),
            percentage_bp: ActiveValue::Set(contract.percentage_bp),
            effective_from: ActiveValue::Set(contract.effective_from),
            effective_to: ActiveValue::Set(contract.effective_to),
            active: ActiveValue::Set(contract.active),
        }
    }
}

impl TryFrom<Model> for PayrollContract {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("contract not exists".to_string()))?,
            person_id: model.person_id,
            person_kind: PersonKind::try_from(model.person_kind.as_str())?,
            center_id: model.center_id,
            fixed_minor: model.fixed_minor,
            hourly_rate_minor: model.hourly_rate_minor,
            percentage_bp: model.percentage_bp,
            effective_from: model.effective_from,
            effective_to: model.effective_to,
            active: model.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_contract() {
        let result = PayrollContract::new(
            "m-1".to_string(),
            PersonKind::Mentor,
            "center-1".to_string(),
            0,
            0,
            0,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn overlap_respects_open_end() {
        let contract = PayrollContract::new(
            "m-1".to_string(),
            PersonKind::Mentor,
            "center-1".to_string(),
            500_00,
            0,
            0,
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            None,
        )
        .unwrap();
        let march_first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let march_last = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert!(contract.overlaps(march_first, march_last));
        let feb_first = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let feb_last = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert!(!contract.overlaps(feb_first, feb_last));
    }
}
