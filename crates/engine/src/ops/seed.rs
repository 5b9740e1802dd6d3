//! Bootstrap constructors: the minimal writes the admin CLI, tests and the
//! seeding endpoints need. Full entity management lives outside this crate.

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Group, ResultEngine, Student, StudentAccount, accounts, groups, students,
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn create_group(&self, group: Group) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            groups::ActiveModel::from(&group).insert(&db_tx).await?;
            Ok(group)
        })
    }

    /// Flips the started flag; the schedulers pick the group up from the
    /// next run onwards.
    pub async fn start_group(&self, group_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            if group.started {
                return Err(EngineError::Conflict(
                    "group has already started".to_string(),
                ));
            }
            let model = groups::ActiveModel {
                id: ActiveValue::Set(group.id.to_string()),
                started: ActiveValue::Set(true),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    pub async fn create_student(
        &self,
        name: &str,
        phone: Option<String>,
    ) -> ResultEngine<Student> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidInput(
                "student name must not be empty".to_string(),
            ));
        }
        let mut student = Student::new(name.to_string());
        student.phone = phone;
        with_tx!(self, |db_tx| {
            students::ActiveModel::from(&student).insert(&db_tx).await?;
            Ok(student)
        })
    }

    /// Opens the wallet account for a student. One account per student; the
    /// code is unique across the center.
    pub async fn open_account(
        &self,
        student_id: Uuid,
        code: &str,
    ) -> ResultEngine<StudentAccount> {
        let account = StudentAccount::new(student_id, code)?;
        with_tx!(self, |db_tx| {
            self.require_student(&db_tx, student_id).await?;
            let by_student = accounts::Entity::find()
                .filter(accounts::Column::StudentId.eq(student_id.to_string()))
                .one(&db_tx)
                .await?;
            if by_student.is_some() {
                return Err(EngineError::Conflict(
                    "student already has an account".to_string(),
                ));
            }
            let by_code = accounts::Entity::find()
                .filter(accounts::Column::Code.eq(account.code.clone()))
                .one(&db_tx)
                .await?;
            if by_code.is_some() {
                return Err(EngineError::Conflict(
                    "account code is already taken".to_string(),
                ));
            }
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }
}
