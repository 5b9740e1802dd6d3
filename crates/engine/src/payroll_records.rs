//! Monthly payroll records.
//!
//! One record per (person, center, month, year). Draft records may be
//! recalculated in place; Approved and Paid records are frozen. Transitions
//! only move forward: Draft → Approved → Paid.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, contracts::PersonKind, period::Period};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    Draft,
    Approved,
    Paid,
}

impl PayrollStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Forward-only transition check.
    #[must_use]
    pub fn can_transition_to(self, next: PayrollStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Approved) | (Self::Approved, Self::Paid)
        )
    }
}

impl TryFrom<&str> for PayrollStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payroll status: {other}"
            ))),
        }
    }
}

/// Computed earnings breakdown for one month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PayrollBreakdown {
    pub minutes: u32,
    pub fixed_minor: i64,
    pub hourly_minor: i64,
    pub percentage_minor: i64,
    pub bonus_minor: i64,
    pub fine_minor: i64,
    pub advance_minor: i64,
}

impl PayrollBreakdown {
    #[must_use]
    pub fn gross_minor(&self) -> i64 {
        self.fixed_minor + self.hourly_minor + self.percentage_minor + self.bonus_minor
    }

    #[must_use]
    pub fn net_minor(&self) -> i64 {
        self.gross_minor() - self.fine_minor - self.advance_minor
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PayrollRecord {
    pub id: Uuid,
    pub person_id: String,
    pub person_kind: PersonKind,
    pub center_id: String,
    pub month: u32,
    pub year: i32,
    pub breakdown: PayrollBreakdown,
    pub gross_minor: i64,
    pub net_minor: i64,
    pub status: PayrollStatus,
}

impl PayrollRecord {
    #[must_use]
    pub fn new(
        person_id: String,
        person_kind: PersonKind,
        center_id: String,
        period: Period,
        breakdown: PayrollBreakdown,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            person_kind,
            center_id,
            month: period.month(),
            year: period.year(),
            gross_minor: breakdown.gross_minor(),
            net_minor: breakdown.net_minor(),
            breakdown,
            status: PayrollStatus::Draft,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payroll_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub person_id: String,
    pub person_kind: String,
    pub center_id: String,
    pub month: i32,
    pub year: i32,
    pub minutes: i32,
    pub fixed_minor: i64,
    pub hourly_minor: i64,
    pub percentage_minor: i64,
    pub bonus_minor: i64,
    pub fine_minor: i64,
    pub advance_minor: i64,
    pub gross_minor: i64,
    pub net_minor: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PayrollRecord> for ActiveModel {
    fn from(record: &PayrollRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            person_id: ActiveValue::Set(record.person_id.clone()),
            person_kind: ActiveValue::Set(record.person_kind.as_str().to_string()),
            center_id: ActiveValue::Set(record.center_id.clone()),
            month: ActiveValue::Set(record.month as i32),
            year: ActiveValue::Set(record.year),
            minutes: ActiveValue::Set(record.breakdown.minutes as i32),
            fixed_minor: ActiveValue::Set(record.breakdown.fixed_minor),
            hourly_minor: ActiveValue::Set(record.breakdown.hourly_minor),
            percentage_minor: ActiveValue::Set(record.breakdown.percentage_minor),
            bonus_minor: ActiveValue::Set(record.breakdown.bonus_minor),
            fine_minor: ActiveValue::Set(record.breakdown.fine_minor),
            advance_minor: ActiveValue::Set(record.breakdown.advance_minor),
            gross_minor: ActiveValue::Set(record.gross_minor),
            net_minor: ActiveValue::Set(record.net_minor),
            status: ActiveValue::Set(record.status.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for PayrollRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let breakdown = PayrollBreakdown {
            minutes: model.minutes.max(0) as u32,
            fixed_minor: model.fixed_minor,
            hourly_minor: model.hourly_minor,
            percentage_minor: model.percentage_minor,
            bonus_minor: model.bonus_minor,
            fine_minor: model.fine_minor,
            advance_minor: model.advance_minor,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("payroll record not exists".to_string()))?,
            person_id: model.person_id,
            person_kind: PersonKind::try_from(model.person_kind.as_str())?,
            center_id: model.center_id,
            month: model.month.max(0) as u32,
            year: model.year,
            breakdown,
            gross_minor: model.gross_minor,
            net_minor: model.net_minor,
            status: PayrollStatus::try_from(model.status.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_forward_only() {
        assert!(PayrollStatus::Draft.can_transition_to(PayrollStatus::Approved));
        assert!(PayrollStatus::Approved.can_transition_to(PayrollStatus::Paid));
        assert!(!PayrollStatus::Draft.can_transition_to(PayrollStatus::Paid));
        assert!(!PayrollStatus::Paid.can_transition_to(PayrollStatus::Approved));
        assert!(!PayrollStatus::Approved.can_transition_to(PayrollStatus::Draft));
    }

    #[test]
    fn gross_and_net_follow_the_breakdown() {
        let breakdown = PayrollBreakdown {
            minutes: 600,
            fixed_minor: 500_00,
            hourly_minor: 200_00,
            percentage_minor: 0,
            bonus_minor: 50_00,
            fine_minor: 30_00,
            advance_minor: 100_00,
        };
        assert_eq!(breakdown.gross_minor(), 750_00);
        assert_eq!(breakdown.net_minor(), 620_00);
    }
}
