//! Lesson/exam progression: the next-(week, day) state machine.
//!
//! One step: find the latest non-deleted lesson, derive the next slot,
//! create the week's exam when the five teaching days are exhausted, and
//! insert the lesson unless it already exists. Re-running a step is a no-op,
//! which is what lets the nightly run and the catch-up path share the same
//! algorithm.

use chrono::{Datelike, NaiveDate, Weekday};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Exam, Group, Lesson, ResultEngine, exams,
    groups::{self, EXAM_DAY_INDEX, TEACHING_DAYS},
    lessons,
};

use super::{BatchOutcome, Engine, with_tx};

/// What one progression step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionOutcome {
    pub week: u32,
    pub day: u32,
    pub lesson_created: bool,
    pub exam_created: bool,
    /// The group's planned weeks are exhausted; nothing further to schedule.
    pub schedule_complete: bool,
}

/// The next slot after the latest existing lesson, plus the week whose exam
/// becomes due when the step crosses a week boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    week: u32,
    day: u32,
    exam_due_week: Option<u32>,
}

fn next_slot(latest: Option<(u32, u32)>) -> Slot {
    match latest {
        None => Slot {
            week: 1,
            day: 1,
            exam_due_week: None,
        },
        Some((week, day)) => {
            let next_day = day + 1;
            if next_day >= EXAM_DAY_INDEX {
                Slot {
                    week: week + 1,
                    day: 1,
                    exam_due_week: Some(week),
                }
            } else {
                Slot {
                    week,
                    day: next_day,
                    exam_due_week: None,
                }
            }
        }
    }
}

fn ensure_group_eligible(group: &Group, today: NaiveDate) -> ResultEngine<()> {
    if group.archived {
        return Err(EngineError::Inactive("group is archived".to_string()));
    }
    if !group.started {
        return Err(EngineError::Inactive("group has not started".to_string()));
    }
    if today < group.start_date || today > group.end_date {
        return Err(EngineError::Inactive(
            "group is outside its academic window".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    async fn latest_lesson(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Option<Lesson>> {
        let model = lessons::Entity::find()
            .filter(lessons::Column::GroupId.eq(group_id.to_string()))
            .filter(lessons::Column::Deleted.eq(false))
            .order_by_desc(lessons::Column::Week)
            .order_by_desc(lessons::Column::Day)
            .one(db_tx)
            .await?;
        model.map(Lesson::try_from).transpose()
    }

    /// Creates the week's exam unless it already exists.
    async fn ensure_exam(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
        week: u32,
        date: NaiveDate,
    ) -> ResultEngine<bool> {
        let existing = exams::Entity::find()
            .filter(exams::Column::GroupId.eq(group_id.to_string()))
            .filter(exams::Column::Week.eq(week as i32))
            .one(db_tx)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }
        let exam = Exam::new(group_id, week, date);
        exams::ActiveModel::from(&exam).insert(db_tx).await?;
        Ok(true)
    }

    async fn lesson_exists(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
        week: u32,
        day: u32,
    ) -> ResultEngine<bool> {
        let existing = lessons::Entity::find()
            .filter(lessons::Column::GroupId.eq(group_id.to_string()))
            .filter(lessons::Column::Week.eq(week as i32))
            .filter(lessons::Column::Day.eq(day as i32))
            .filter(lessons::Column::Deleted.eq(false))
            .one(db_tx)
            .await?;
        Ok(existing.is_some())
    }

    async fn insert_lesson_if_missing(
        &self,
        db_tx: &DatabaseTransaction,
        group: &Group,
        week: u32,
        day: u32,
    ) -> ResultEngine<bool> {
        if self.lesson_exists(db_tx, group.id, week, day).await? {
            return Ok(false);
        }
        let lesson = Lesson::new(
            group.id,
            week,
            day,
            group.slot_date(week, day),
            group.lesson_start,
            group.lesson_end,
        );
        lessons::ActiveModel::from(&lesson).insert(db_tx).await?;
        Ok(true)
    }

    async fn bump_current_week(
        &self,
        db_tx: &DatabaseTransaction,
        group: &Group,
        week: u32,
    ) -> ResultEngine<()> {
        if group.current_week == week {
            return Ok(());
        }
        let model = groups::ActiveModel {
            id: ActiveValue::Set(group.id.to_string()),
            current_week: ActiveValue::Set(week as i32),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(())
    }

    /// One progression step for a group.
    pub async fn advance_group_schedule(
        &self,
        group_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<ProgressionOutcome> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            ensure_group_eligible(&group, today)?;
            if self.active_students_tx(&db_tx, group_id).await?.is_empty() {
                return Err(EngineError::Inactive(
                    "no active students enrolled".to_string(),
                ));
            }

            let latest = self.latest_lesson(&db_tx, group_id).await?;
            let slot = next_slot(latest.map(|l| (l.week, l.day)));

            // The exam-or-skip decision happens before the next week starts,
            // including after the final teaching week.
            let mut exam_created = false;
            if let Some(exam_week) = slot.exam_due_week {
                exam_created = self.ensure_exam(&db_tx, group_id, exam_week, today).await?;
            }

            // No early return here: the exam insert above must still commit
            // when the planned weeks are exhausted.
            let outcome = if slot.week > group.total_weeks {
                ProgressionOutcome {
                    week: slot.week,
                    day: slot.day,
                    lesson_created: false,
                    exam_created,
                    schedule_complete: true,
                }
            } else {
                let lesson_created = self
                    .insert_lesson_if_missing(&db_tx, &group, slot.week, slot.day)
                    .await?;
                self.bump_current_week(&db_tx, &group, slot.week).await?;
                ProgressionOutcome {
                    week: slot.week,
                    day: slot.day,
                    lesson_created,
                    exam_created,
                    schedule_complete: false,
                }
            };

            Ok(outcome)
        })
    }

    /// Applies progression steps until the schedule has caught up with
    /// `today`. Used on non-teaching days and to recover missed runs.
    pub async fn catch_up_group(&self, group_id: Uuid, today: NaiveDate) -> ResultEngine<u32> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            ensure_group_eligible(&group, today)?;
            if self.active_students_tx(&db_tx, group_id).await?.is_empty() {
                return Err(EngineError::Inactive(
                    "no active students enrolled".to_string(),
                ));
            }

            let mut steps = 0u32;
            let cap = group.total_weeks * (TEACHING_DAYS + 1);
            let mut top_week = group.current_week;
            loop {
                let latest = self.latest_lesson(&db_tx, group_id).await?;
                let slot = next_slot(latest.map(|l| (l.week, l.day)));

                if let Some(exam_week) = slot.exam_due_week {
                    self.ensure_exam(&db_tx, group_id, exam_week, today).await?;
                }
                if slot.week > group.total_weeks {
                    break;
                }
                if group.slot_date(slot.week, slot.day) > today {
                    break;
                }

                self.insert_lesson_if_missing(&db_tx, &group, slot.week, slot.day)
                    .await?;
                top_week = slot.week;
                steps += 1;
                if steps >= cap {
                    break;
                }
            }

            self.bump_current_week(&db_tx, &group, top_week).await?;
            Ok(steps)
        })
    }

    /// The nightly unit of work: one step per eligible group on teaching
    /// days, the catch-up path otherwise. Per-group failures are isolated.
    pub async fn run_daily_progression(&self, today: NaiveDate) -> ResultEngine<BatchOutcome> {
        let group_ids = self.eligible_group_ids(today).await?;
        let weekday = !matches!(today.weekday(), Weekday::Sat | Weekday::Sun);

        let mut outcome = BatchOutcome::default();
        for group_id in group_ids {
            let result = if weekday {
                self.advance_group_schedule(group_id, today).await.map(|_| ())
            } else {
                self.catch_up_group(group_id, today).await.map(|_| ())
            };
            match result {
                Ok(()) => outcome.success(),
                // Ineligible groups (no students yet, paused) are not errors.
                Err(EngineError::Inactive(_)) => outcome.skip(),
                Err(err) => outcome.fail(group_id.to_string(), &err),
            }
        }
        Ok(outcome)
    }

    /// Non-deleted lessons of a group, ordered by (week, day).
    pub async fn lessons_for_group(&self, group_id: Uuid) -> ResultEngine<Vec<Lesson>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models: Vec<lessons::Model> = lessons::Entity::find()
                .filter(lessons::Column::GroupId.eq(group_id.to_string()))
                .filter(lessons::Column::Deleted.eq(false))
                .order_by_asc(lessons::Column::Week)
                .order_by_asc(lessons::Column::Day)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Lesson::try_from).collect()
        })
    }

    /// Exams of a group, ordered by week.
    pub async fn exams_for_group(&self, group_id: Uuid) -> ResultEngine<Vec<Exam>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models: Vec<exams::Model> = exams::Entity::find()
                .filter(exams::Column::GroupId.eq(group_id.to_string()))
                .order_by_asc(exams::Column::Week)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Exam::try_from).collect()
        })
    }

    async fn eligible_group_ids(&self, today: NaiveDate) -> ResultEngine<Vec<Uuid>> {
        with_tx!(self, |db_tx| {
            let models = groups::Entity::find()
                .filter(groups::Column::Started.eq(true))
                .filter(groups::Column::Archived.eq(false))
                .filter(groups::Column::StartDate.lte(today))
                .filter(groups::Column::EndDate.gte(today))
                .all(&db_tx)
                .await?;
            let mut ids = Vec::with_capacity(models.len());
            for model in models {
                ids.push(Group::try_from(model)?.id);
            }
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_slot_is_week_one_day_one() {
        let slot = next_slot(None);
        assert_eq!((slot.week, slot.day), (1, 1));
        assert_eq!(slot.exam_due_week, None);
    }

    #[test]
    fn slot_advances_within_the_week() {
        let slot = next_slot(Some((3, 2)));
        assert_eq!((slot.week, slot.day), (3, 3));
        assert_eq!(slot.exam_due_week, None);
    }

    #[test]
    fn day_five_rolls_the_week_and_flags_the_exam() {
        let slot = next_slot(Some((1, 5)));
        assert_eq!((slot.week, slot.day), (2, 1));
        assert_eq!(slot.exam_due_week, Some(1));
    }
}
