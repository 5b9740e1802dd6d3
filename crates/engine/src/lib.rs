//! Domain core of the education-center backend: the academic calendar
//! (lesson/exam progression, weekly journals) and the financial ledgers
//! (student wallets, payroll). Everything stateful is keyed so re-running an
//! operation detects the existing row instead of duplicating it; the
//! recurring job loops rely on that.

pub use accounts::StudentAccount;
pub use account_logs::{AccountLog, LogKind, Performer};
pub use advances::{Advance, AdvanceStatus};
pub use clock::CenterClock;
pub use contracts::{PayrollContract, PersonKind};
pub use enrollments::{Enrollment, PaymentStatus};
pub use error::EngineError;
pub use exams::Exam;
pub use groups::Group;
pub use journal_entries::{AttendanceStatus, JournalEntry, LessonKind};
pub use journals::Journal;
pub use lessons::Lesson;
pub use money::Money;
pub use notify::{LogNotifier, Notifier, NotifyError, PaymentEvent};
pub use ops::{
    BatchFailure, BatchOutcome, ChargeOutcome, Engine, EngineBuilder, EntryPatch, MonthlySummary,
    PayrollInputs, ProgressionOutcome, WeekTotal,
};
pub use payroll_records::{PayrollBreakdown, PayrollRecord, PayrollStatus};
pub use period::Period;
pub use scheduler::{JobSchedule, RecurringJob};
pub use students::Student;
pub use work_logs::WorkLog;

mod account_logs;
mod accounts;
mod advances;
mod clock;
mod contracts;
mod enrollments;
mod error;
mod exams;
mod groups;
mod journal_entries;
mod journals;
mod lessons;
mod money;
mod notify;
mod ops;
mod payroll_records;
mod period;
mod scheduler;
mod students;
mod work_logs;

type ResultEngine<T> = Result<T, EngineError>;
