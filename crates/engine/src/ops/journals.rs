//! Weekly journal generation and maintenance.
//!
//! A journal materializes one week of the group's lesson template: one entry
//! per active student per (day, lesson number) slot, plus the week's exam
//! slot. Generation is guarded by the (group, week number) natural key, so a
//! second run conflicts instead of duplicating the sheet.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    AttendanceStatus, EngineError, Group, Journal, JournalEntry, LessonKind, Performer,
    ResultEngine,
    groups::{self, EXAM_DAY_INDEX, TEACHING_DAYS},
    journal_entries, journals,
};

use super::{BatchOutcome, Engine, with_tx};

/// Partial update for one journal entry; `None` leaves the field unchanged.
#[derive(Clone, Debug, Default)]
pub struct EntryPatch {
    pub grade: Option<f64>,
    pub bonus: Option<f64>,
    pub attendance: Option<AttendanceStatus>,
    pub comment: Option<String>,
}

/// Per-student sum of grade + bonus across one journal week.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekTotal {
    pub student_id: Uuid,
    pub total: f64,
}

/// The sheet slots of one week: five teaching days with `lessons_per_day`
/// lessons each, then the exam slot.
fn week_slots(lessons_per_day: u32) -> Vec<(u32, u32, LessonKind)> {
    let mut slots = Vec::with_capacity((TEACHING_DAYS * lessons_per_day + 1) as usize);
    for day in 1..=TEACHING_DAYS {
        for lesson_number in 1..=lessons_per_day {
            slots.push((day, lesson_number, LessonKind::Regular));
        }
    }
    slots.push((EXAM_DAY_INDEX, 1, LessonKind::Exam));
    slots
}

/// Day index of `date` within a journal window (1-based; 7 = the closing
/// Sunday, past the exam slot).
fn day_index_in_window(week_start: NaiveDate, date: NaiveDate) -> i64 {
    (date - week_start).num_days() + 1
}

fn slot_in_template(group: &Group, day: u32, lesson_number: u32, kind: LessonKind) -> bool {
    match kind {
        LessonKind::Regular => {
            (1..=TEACHING_DAYS).contains(&day) && (1..=group.lessons_per_day).contains(&lesson_number)
        }
        LessonKind::Exam => day == EXAM_DAY_INDEX && lesson_number == 1,
    }
}

impl Engine {
    async fn find_journal(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
        week_number: u32,
    ) -> ResultEngine<Option<Journal>> {
        let model = journals::Entity::find()
            .filter(journals::Column::GroupId.eq(group_id.to_string()))
            .filter(journals::Column::WeekNumber.eq(week_number as i32))
            .one(db_tx)
            .await?;
        model.map(Journal::try_from).transpose()
    }

    async fn latest_journal(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Option<Journal>> {
        let model = journals::Entity::find()
            .filter(journals::Column::GroupId.eq(group_id.to_string()))
            .order_by_desc(journals::Column::WeekNumber)
            .one(db_tx)
            .await?;
        model.map(Journal::try_from).transpose()
    }

    /// The journal of `group_id` whose week window contains `date`.
    async fn journal_containing(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<Option<Journal>> {
        let model = journals::Entity::find()
            .filter(journals::Column::GroupId.eq(group_id.to_string()))
            .filter(journals::Column::WeekStart.lte(date))
            .filter(journals::Column::WeekEnd.gte(date))
            .one(db_tx)
            .await?;
        model.map(Journal::try_from).transpose()
    }

    async fn generate_in_window(
        &self,
        db_tx: &DatabaseTransaction,
        group: &Group,
        week_number: u32,
        week_start: NaiveDate,
    ) -> ResultEngine<Journal> {
        if week_number == 0 || week_number > group.total_weeks {
            return Err(EngineError::InvalidInput(format!(
                "week number must be 1..={}, got {week_number}",
                group.total_weeks
            )));
        }
        if self.find_journal(db_tx, group.id, week_number).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "journal for week {week_number} already exists"
            )));
        }

        let journal = Journal::new(
            group.id,
            week_number,
            week_start,
            week_start + Duration::days(6),
        );
        journals::ActiveModel::from(&journal).insert(db_tx).await?;

        let students = self.active_students_tx(db_tx, group.id).await?;
        for student in &students {
            for (day, lesson_number, kind) in week_slots(group.lessons_per_day) {
                let mut entry = JournalEntry::blank(journal.id, student.id, day, lesson_number);
                entry.kind = kind;
                journal_entries::ActiveModel::from(&entry).insert(db_tx).await?;
            }
        }

        Ok(journal)
    }

    /// Materializes the journal for (group, week number) with the window
    /// derived from the group's start date.
    pub async fn generate_journal(
        &self,
        group_id: Uuid,
        week_number: u32,
    ) -> ResultEngine<Journal> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            let (week_start, _) = group.week_window(week_number.max(1));
            self.generate_in_window(&db_tx, &group, week_number, week_start)
                .await
        })
    }

    /// Same as [`Engine::generate_journal`] with the week window rebased to
    /// an arbitrary start date (groups restarting mid-cycle).
    pub async fn generate_journal_from_date(
        &self,
        group_id: Uuid,
        week_number: u32,
        week_start: NaiveDate,
    ) -> ResultEngine<Journal> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            self.generate_in_window(&db_tx, &group, week_number, week_start)
                .await
        })
    }

    /// The scheduler unit of work: generate the next week for every group
    /// whose latest journal has closed.
    pub async fn roll_forward_journals(&self, today: NaiveDate) -> ResultEngine<BatchOutcome> {
        let candidates = with_tx!(self, |db_tx| {
            let models = groups::Entity::find()
                .filter(groups::Column::Started.eq(true))
                .filter(groups::Column::Archived.eq(false))
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let group = Group::try_from(model)?;
                let latest = self.latest_journal(&db_tx, group.id).await?;
                out.push((group, latest));
            }
            Ok(out)
        })?;

        let mut outcome = BatchOutcome::default();
        for (group, latest) in candidates {
            let next_week = match &latest {
                None if today >= group.start_date => 1,
                None => {
                    outcome.skip();
                    continue;
                }
                Some(journal) => {
                    if journal.week_end < today && journal.week_number < group.total_weeks {
                        journal.week_number + 1
                    } else {
                        outcome.skip();
                        continue;
                    }
                }
            };

            match self.generate_journal(group.id, next_week).await {
                Ok(_) => outcome.success(),
                // Another loop may have generated it between the scan and now.
                Err(EngineError::Conflict(_)) => outcome.skip(),
                Err(err) => outcome.fail(group.id.to_string(), &err),
            }
        }
        Ok(outcome)
    }

    /// Creates entries for a student for the remaining days of the current
    /// week. Past days are never touched. Returns the number created.
    pub async fn backfill_student(
        &self,
        group_id: Uuid,
        student_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            self.require_student(&db_tx, student_id).await?;
            let Some(journal) = self.journal_containing(&db_tx, group_id, today).await? else {
                return Ok(0);
            };

            let from_day = day_index_in_window(journal.week_start, today).max(1);
            let existing: Vec<journal_entries::Model> = journal_entries::Entity::find()
                .filter(journal_entries::Column::JournalId.eq(journal.id.to_string()))
                .filter(journal_entries::Column::StudentId.eq(student_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut created = 0usize;
            for (day, lesson_number, kind) in week_slots(group.lessons_per_day) {
                if i64::from(day) < from_day {
                    continue;
                }
                let present = existing
                    .iter()
                    .any(|e| e.day == day as i32 && e.lesson_number == lesson_number as i32);
                if present {
                    continue;
                }
                let mut entry = JournalEntry::blank(journal.id, student_id, day, lesson_number);
                entry.kind = kind;
                journal_entries::ActiveModel::from(&entry).insert(&db_tx).await?;
                created += 1;
            }
            Ok(created)
        })
    }

    /// Deletes a student's not-yet-occurred entries: days after `today` in
    /// the current week, and every entry of later weeks. Returns the number
    /// removed.
    pub async fn remove_student_future_entries(
        &self,
        group_id: Uuid,
        student_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let mut removed = 0usize;

            if let Some(journal) = self.journal_containing(&db_tx, group_id, today).await? {
                let past_day = day_index_in_window(journal.week_start, today);
                let result = journal_entries::Entity::delete_many()
                    .filter(journal_entries::Column::JournalId.eq(journal.id.to_string()))
                    .filter(journal_entries::Column::StudentId.eq(student_id.to_string()))
                    .filter(journal_entries::Column::Day.gt(past_day as i32))
                    .exec(&db_tx)
                    .await?;
                removed += result.rows_affected as usize;
            }

            let future_journals: Vec<journals::Model> = journals::Entity::find()
                .filter(journals::Column::GroupId.eq(group_id.to_string()))
                .filter(journals::Column::WeekStart.gt(today))
                .all(&db_tx)
                .await?;
            for journal in future_journals {
                let result = journal_entries::Entity::delete_many()
                    .filter(journal_entries::Column::JournalId.eq(journal.id.clone()))
                    .filter(journal_entries::Column::StudentId.eq(student_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                removed += result.rows_affected as usize;
            }

            Ok(removed)
        })
    }

    /// Explicit single-entry mutation by a mentor.
    pub async fn update_entry(
        &self,
        entry_id: Uuid,
        patch: EntryPatch,
        author: &Performer,
    ) -> ResultEngine<JournalEntry> {
        with_tx!(self, |db_tx| {
            let model = journal_entries::Entity::find_by_id(entry_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("journal entry not exists".to_string()))?;
            let mut entry = JournalEntry::try_from(model)?;

            let journal_model = journals::Entity::find_by_id(entry.journal_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("journal not exists".to_string()))?;
            let journal = Journal::try_from(journal_model)?;
            let group = self.require_group(&db_tx, journal.group_id).await?;

            if !slot_in_template(&group, entry.day, entry.lesson_number, entry.kind) {
                return Err(EngineError::Conflict(
                    "entry slot is no longer part of the group's lesson template".to_string(),
                ));
            }

            if let Some(grade) = patch.grade {
                if !(0.0..=100.0).contains(&grade) {
                    return Err(EngineError::InvalidInput(
                        "grade must be within 0..=100".to_string(),
                    ));
                }
                entry.grade = Some(grade);
            }
            if let Some(bonus) = patch.bonus {
                if bonus < 0.0 {
                    return Err(EngineError::InvalidInput(
                        "bonus must be >= 0".to_string(),
                    ));
                }
                entry.bonus = Some(bonus);
            }
            if let Some(attendance) = patch.attendance {
                entry.attendance = attendance;
            }
            if let Some(comment) = patch.comment {
                entry.comment = Some(comment);
                entry.comment_author_id = Some(author.id.clone());
                entry.comment_author_name = Some(author.name.clone());
            }

            let model = journal_entries::ActiveModel {
                id: ActiveValue::Set(entry.id.to_string()),
                grade: ActiveValue::Set(entry.grade),
                bonus: ActiveValue::Set(entry.bonus),
                attendance: ActiveValue::Set(entry.attendance.as_str().to_string()),
                comment: ActiveValue::Set(entry.comment.clone()),
                comment_author_id: ActiveValue::Set(entry.comment_author_id.clone()),
                comment_author_name: ActiveValue::Set(entry.comment_author_name.clone()),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(entry)
        })
    }

    /// Removes a journal and all of its entries (administrative repair).
    pub async fn delete_journal(&self, journal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = journals::Entity::find_by_id(journal_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("journal not exists".to_string()))?;
            journal_entries::Entity::delete_many()
                .filter(journal_entries::Column::JournalId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            journals::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn week_entries(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: Uuid,
        week_number: u32,
    ) -> ResultEngine<Vec<JournalEntry>> {
        let journal = self
            .find_journal(db_tx, group_id, week_number)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("journal not exists".to_string()))?;
        let models: Vec<journal_entries::Model> = journal_entries::Entity::find()
            .filter(journal_entries::Column::JournalId.eq(journal.id.to_string()))
            .all(db_tx)
            .await?;
        models.into_iter().map(JournalEntry::try_from).collect()
    }

    /// One student's entries on one week's sheet, ordered by (day, lesson
    /// number).
    pub async fn journal_entries_for_student(
        &self,
        group_id: Uuid,
        week_number: u32,
        student_id: Uuid,
    ) -> ResultEngine<Vec<JournalEntry>> {
        with_tx!(self, |db_tx| {
            let journal = self
                .find_journal(&db_tx, group_id, week_number)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("journal not exists".to_string()))?;
            let models: Vec<journal_entries::Model> = journal_entries::Entity::find()
                .filter(journal_entries::Column::JournalId.eq(journal.id.to_string()))
                .filter(journal_entries::Column::StudentId.eq(student_id.to_string()))
                .order_by_asc(journal_entries::Column::Day)
                .order_by_asc(journal_entries::Column::LessonNumber)
                .all(&db_tx)
                .await?;
            models.into_iter().map(JournalEntry::try_from).collect()
        })
    }

    /// Σ(grade + bonus) for one student across one journal week.
    pub async fn student_week_total(
        &self,
        group_id: Uuid,
        week_number: u32,
        student_id: Uuid,
    ) -> ResultEngine<f64> {
        with_tx!(self, |db_tx| {
            let entries = self.week_entries(&db_tx, group_id, week_number).await?;
            Ok(entries
                .iter()
                .filter(|e| e.student_id == student_id)
                .map(JournalEntry::total)
                .sum())
        })
    }

    /// Week totals for every student on the sheet.
    pub async fn group_week_totals(
        &self,
        group_id: Uuid,
        week_number: u32,
    ) -> ResultEngine<Vec<WeekTotal>> {
        with_tx!(self, |db_tx| {
            let entries = self.week_entries(&db_tx, group_id, week_number).await?;
            let mut totals: HashMap<Uuid, f64> = HashMap::new();
            for entry in &entries {
                *totals.entry(entry.student_id).or_insert(0.0) += entry.total();
            }
            let mut out: Vec<WeekTotal> = totals
                .into_iter()
                .map(|(student_id, total)| WeekTotal { student_id, total })
                .collect();
            out.sort_by(|a, b| a.student_id.cmp(&b.student_id));
            Ok(out)
        })
    }

    /// Fraction of the sheet's students whose week total meets `threshold`.
    pub async fn pass_rate(
        &self,
        group_id: Uuid,
        week_number: u32,
        threshold: f64,
    ) -> ResultEngine<f64> {
        let totals = self.group_week_totals(group_id, week_number).await?;
        if totals.is_empty() {
            return Ok(0.0);
        }
        let passed = totals.iter().filter(|t| t.total >= threshold).count();
        Ok(passed as f64 / totals.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_slots_cover_template_plus_exam() {
        let slots = week_slots(2);
        assert_eq!(slots.len(), 11);
        assert!(slots.contains(&(1, 1, LessonKind::Regular)));
        assert!(slots.contains(&(5, 2, LessonKind::Regular)));
        assert_eq!(slots.last(), Some(&(EXAM_DAY_INDEX, 1, LessonKind::Exam)));
    }

    #[test]
    fn day_index_is_one_based() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(day_index_in_window(start, start), 1);
        assert_eq!(
            day_index_in_window(start, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()),
            7
        );
    }
}
