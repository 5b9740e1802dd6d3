//! Roster lookups shared by the generator, ledger and payroll.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Enrollment, Group, ResultEngine, Student, enrollments, groups, students,
};

use super::{Engine, with_tx};

impl Engine {
    pub(crate) async fn require_group(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Group> {
        let model = groups::Entity::find_by_id(group_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        Group::try_from(model)
    }

    pub(crate) async fn require_student(
        &self,
        db_tx: &DatabaseTransaction,
        student_id: Uuid,
    ) -> ResultEngine<Student> {
        let model = students::Entity::find_by_id(student_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("student not exists".to_string()))?;
        Student::try_from(model)
    }

    /// The active enrollment binding a student to a group.
    pub(crate) async fn require_enrollment(
        &self,
        db_tx: &DatabaseTransaction,
        student_id: Uuid,
        group_id: Uuid,
    ) -> ResultEngine<Enrollment> {
        let model = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student_id.to_string()))
            .filter(enrollments::Column::GroupId.eq(group_id.to_string()))
            .filter(enrollments::Column::Active.eq(true))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("enrollment not exists".to_string()))?;
        Enrollment::try_from(model)
    }

    /// Active students currently enrolled in a group.
    pub(crate) async fn active_students_tx(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Student>> {
        let rows: Vec<(enrollments::Model, Option<students::Model>)> = enrollments::Entity::find()
            .filter(enrollments::Column::GroupId.eq(group_id.to_string()))
            .filter(enrollments::Column::Active.eq(true))
            .find_also_related(students::Entity)
            .all(db_tx)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (_, student_model) in rows {
            let Some(student_model) = student_model else {
                continue;
            };
            if !student_model.active {
                continue;
            }
            out.push(Student::try_from(student_model)?);
        }
        Ok(out)
    }

    pub async fn active_students(&self, group_id: Uuid) -> ResultEngine<Vec<Student>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.active_students_tx(&db_tx, group_id).await
        })
    }

    /// Every active (student, group) pair in the system. Archived groups and
    /// inactive students are excluded.
    pub(crate) async fn active_enrollment_pairs(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<Vec<(Uuid, Uuid)>> {
        let rows: Vec<(enrollments::Model, Option<students::Model>)> = enrollments::Entity::find()
            .filter(enrollments::Column::Active.eq(true))
            .find_also_related(students::Entity)
            .all(db_tx)
            .await?;

        let archived: Vec<String> = groups::Entity::find()
            .filter(groups::Column::Archived.eq(true))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();

        let mut out = Vec::with_capacity(rows.len());
        for (enrollment_model, student_model) in rows {
            if !student_model.is_some_and(|s| s.active) {
                continue;
            }
            if archived.contains(&enrollment_model.group_id) {
                continue;
            }
            let enrollment = Enrollment::try_from(enrollment_model)?;
            out.push((enrollment.student_id, enrollment.group_id));
        }
        Ok(out)
    }

    /// Monthly amount due for one enrollment: group fee minus the enrollment
    /// discount, floored at zero.
    pub(crate) fn amount_due(group: &Group, enrollment: &Enrollment) -> i64 {
        (group.monthly_fee_minor - enrollment.discount_minor).max(0)
    }

    /// Current payment status of an active enrollment.
    pub async fn enrollment_status(
        &self,
        student_id: Uuid,
        group_id: Uuid,
    ) -> ResultEngine<crate::PaymentStatus> {
        with_tx!(self, |db_tx| {
            let enrollment = self.require_enrollment(&db_tx, student_id, group_id).await?;
            Ok(enrollment.payment_status)
        })
    }

    /// Enrolls a student into a group and backfills the current journal week.
    pub async fn enroll_student(
        &self,
        student_id: Uuid,
        group_id: Uuid,
        discount_minor: i64,
        today: NaiveDate,
    ) -> ResultEngine<Enrollment> {
        if discount_minor < 0 {
            return Err(EngineError::InvalidInput(
                "discount must be >= 0".to_string(),
            ));
        }
        let enrollment = with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            let student = self.require_student(&db_tx, student_id).await?;
            if !student.active {
                return Err(EngineError::Inactive("student is inactive".to_string()));
            }
            if discount_minor > group.monthly_fee_minor {
                return Err(EngineError::InvalidInput(
                    "discount exceeds the monthly fee".to_string(),
                ));
            }
            let existing = enrollments::Entity::find()
                .filter(enrollments::Column::StudentId.eq(student_id.to_string()))
                .filter(enrollments::Column::GroupId.eq(group_id.to_string()))
                .filter(enrollments::Column::Active.eq(true))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::Conflict(
                    "student is already enrolled in this group".to_string(),
                ));
            }

            let enrollment = Enrollment::new(student_id, group_id, discount_minor, today);
            enrollments::ActiveModel::from(&enrollment).insert(&db_tx).await?;
            Ok(enrollment)
        })?;

        // Mid-week joiners get sheet entries for the remaining days only.
        self.backfill_student(group_id, student_id, today).await?;
        Ok(enrollment)
    }

    /// Deactivates an enrollment and removes the student's not-yet-occurred
    /// journal entries, preserving history.
    pub async fn withdraw_student(
        &self,
        student_id: Uuid,
        group_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let enrollment = self.require_enrollment(&db_tx, student_id, group_id).await?;
            let model = enrollments::ActiveModel {
                id: ActiveValue::Set(enrollment.id.to_string()),
                active: ActiveValue::Set(false),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })?;

        self.remove_student_future_entries(group_id, student_id, today)
            .await
    }
}
