//! Students (roster leaf).
//!
//! Only the columns the calendar and ledger need; full student management
//! lives outside this crate.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub active: bool,
}

impl Student {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone: None,
            active: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Student> for ActiveModel {
    fn from(student: &Student) -> Self {
        Self {
            id: ActiveValue::Set(student.id.to_string()),
            name: ActiveValue::Set(student.name.clone()),
            phone: ActiveValue::Set(student.phone.clone()),
            active: ActiveValue::Set(student.active),
        }
    }
}

impl TryFrom<Model> for Student {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("student not exists".to_string()))?,
            name: model.name,
            phone: model.phone,
            active: model.active,
        })
    }
}
