//! Enrollments: the (student, group) membership the roster queries walk.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub group_id: Uuid,
    pub discount_minor: i64,
    pub payment_status: PaymentStatus,
    pub active: bool,
    pub joined_on: NaiveDate,
}

impl Enrollment {
    #[must_use]
    pub fn new(student_id: Uuid, group_id: Uuid, discount_minor: i64, joined_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            group_id,
            discount_minor,
            payment_status: PaymentStatus::Pending,
            active: true,
            joined_on,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub group_id: String,
    pub discount_minor: i64,
    pub payment_status: String,
    pub active: bool,
    pub joined_on: Date,
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
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Enrollment> for ActiveModel {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            id: ActiveValue::Set(enrollment.id.to_string()),
            student_id: ActiveValue::Set(enrollment.student_id.to_string()),
            group_id: ActiveValue::Set(enrollment.group_id.to_string()),
            discount_minor: ActiveValue::Set(enrollment.discount_minor),
            payment_status: ActiveValue::Set(enrollment.payment_status.as_str().to_string()),
            active: ActiveValue::Set(enrollment.active),
            joined_on: ActiveValue::Set(enrollment.joined_on),
        }
    }
}

impl TryFrom<Model> for Enrollment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("enrollment not exists".to_string()))?,
            student_id: Uuid::parse_str(&model.student_id)
                .map_err(|_| EngineError::KeyNotFound("student not exists".to_string()))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::KeyNotFound("group not exists".to_string()))?,
            discount_minor: model.discount_minor,
            payment_status: PaymentStatus::try_from(model.payment_status.as_str())?,
            active: model.active,
            joined_on: model.joined_on,
        })
    }
}
