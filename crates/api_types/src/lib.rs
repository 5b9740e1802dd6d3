//! Wire types shared by the HTTP server and its clients.
//!
//! Every mutating endpoint takes one of these request bodies and returns
//! either a typed payload or a JSON error body; batch endpoints return a
//! [`batch::BatchReport`] with aggregate counts plus the failed identifiers.

use serde::{Deserialize, Serialize};

pub mod batch {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchFailureView {
        pub id: String,
        pub reason: String,
    }

    /// Aggregate outcome of a batch operation.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchReport {
        pub succeeded: usize,
        pub skipped: usize,
        pub failures: Vec<BatchFailureView>,
    }
}

pub mod jobs {
    use super::*;
    use chrono::NaiveDate;

    /// Body for the run-now job endpoints. Defaults to the center's current
    /// civil date / month when omitted.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct JobRun {
        pub date: Option<NaiveDate>,
        pub month: Option<u32>,
        pub year: Option<i32>,
    }
}

pub mod journal {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Attendance {
        Unset,
        Present,
        Absent,
        Late,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Regular,
        Exam,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalGenerate {
        pub group_id: Uuid,
        pub week_number: u32,
        /// Rebases the week window when present (mid-cycle restarts).
        pub week_start: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub week_number: u32,
        pub week_start: NaiveDate,
        pub week_end: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Backfill {
        pub group_id: Uuid,
        pub student_id: Uuid,
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BackfillResult {
        pub entries_changed: usize,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryUpdate {
        pub grade: Option<f64>,
        pub bonus: Option<f64>,
        pub attendance: Option<Attendance>,
        pub comment: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub journal_id: Uuid,
        pub student_id: Uuid,
        pub day: u32,
        pub lesson_number: u32,
        pub grade: Option<f64>,
        pub bonus: Option<f64>,
        pub attendance: Attendance,
        pub comment: Option<String>,
        pub comment_author_name: Option<String>,
        pub kind: EntryKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeekQuery {
        pub group_id: Uuid,
        pub week_number: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeekTotalView {
        pub student_id: Uuid,
        pub total: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeekTotalsResponse {
        pub totals: Vec<WeekTotalView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PassRateQuery {
        pub group_id: Uuid,
        pub week_number: u32,
        pub threshold: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PassRateView {
        pub rate: f64,
    }
}

pub mod ledger {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUp {
        pub account_code: String,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Charge {
        pub student_id: Uuid,
        pub group_id: Uuid,
        pub month: u32,
        pub year: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChargeMonth {
        pub month: u32,
        pub year: i32,
        /// Restricts the run to one group when present.
        pub group_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub code: String,
        pub student_id: Uuid,
        pub balance_minor: i64,
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChargeResult {
        /// `charged`, `already_charged` or `nothing_due`.
        pub outcome: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LogView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub kind: String,
        pub note: Option<String>,
        pub performer_name: String,
        pub group_id: Option<Uuid>,
        pub period_key: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LogsQuery {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LogsResponse {
        pub logs: Vec<LogView>,
        pub next_cursor: Option<String>,
    }
}

pub mod payroll {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PersonKind {
        Mentor,
        Employee,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WorkLogNew {
        pub person_id: String,
        pub person_kind: PersonKind,
        pub date: NaiveDate,
        pub minutes: u32,
        pub group_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WorkLogUpdate {
        pub date: NaiveDate,
        pub minutes: u32,
        pub group_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WorkLogView {
        pub id: Uuid,
        pub person_id: String,
        pub person_kind: PersonKind,
        pub date: NaiveDate,
        pub minutes: u32,
        pub group_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Calculate {
        pub person_id: String,
        pub person_kind: PersonKind,
        pub center_id: String,
        pub month: u32,
        pub year: i32,
        pub bonus_minor: Option<i64>,
        pub fine_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CalculateMonth {
        pub center_id: String,
        pub month: u32,
        pub year: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordView {
        pub id: Uuid,
        pub person_id: String,
        pub person_kind: PersonKind,
        pub center_id: String,
        pub month: u32,
        pub year: i32,
        pub minutes: u32,
        pub fixed_minor: i64,
        pub hourly_minor: i64,
        pub percentage_minor: i64,
        pub bonus_minor: i64,
        pub fine_minor: i64,
        pub advance_minor: i64,
        pub gross_minor: i64,
        pub net_minor: i64,
        /// `draft`, `approved` or `paid`.
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdvanceNew {
        pub person_id: String,
        pub person_kind: PersonKind,
        pub center_id: String,
        pub amount_minor: i64,
        pub month: u32,
        pub year: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdvanceView {
        pub id: Uuid,
        pub person_id: String,
        pub amount_minor: i64,
        pub month: u32,
        pub year: i32,
        /// `pending`, `settled` or `cancelled`.
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub center_id: String,
        pub month: u32,
        pub year: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryView {
        pub records: Vec<RecordView>,
        pub total_gross_minor: i64,
        pub total_net_minor: i64,
    }
}

pub mod seed {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub mentor_id: String,
        pub start_date: NaiveDate,
        pub total_weeks: u32,
        pub lessons_per_day: u32,
        pub lesson_start: NaiveTime,
        pub lesson_end: NaiveTime,
        pub monthly_fee_minor: i64,
        pub classroom: Option<String>,
        /// Starts the group immediately when true.
        pub start: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub total_weeks: u32,
        pub started: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentNew {
        pub name: String,
        pub phone: Option<String>,
        /// Opens the wallet account alongside the student when present.
        pub account_code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentView {
        pub id: Uuid,
        pub name: String,
        pub account_code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EnrollmentNew {
        pub student_id: Uuid,
        pub group_id: Uuid,
        pub discount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EnrollmentView {
        pub id: Uuid,
        pub student_id: Uuid,
        pub group_id: Uuid,
        pub discount_minor: i64,
    }
}
