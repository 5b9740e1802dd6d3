//! Student ledger operations.
//!
//! Every balance change is an appended log row; the stored balance is bumped
//! in the same transaction. Charges are keyed by (account, period key), so a
//! repeated charge for the same month detects the existing row and no-ops.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountLog, EngineError, LogKind, PaymentStatus, Performer, Period, ResultEngine,
    StudentAccount, account_logs,
    accounts::{self, normalize_code},
    enrollments,
    notify::PaymentEvent,
};

use super::{BatchOutcome, Engine, with_tx};

/// Result of one charge attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChargeOutcome {
    Charged { amount_minor: i64 },
    /// A charge row for this (account, group, month) already exists.
    AlreadyCharged,
    /// Fee minus discount came to zero; nothing to append.
    NothingDue,
}

fn charge_period_key(group_id: Uuid, period: Period) -> String {
    format!("{group_id}:{}", period.key())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LogsCursor {
    created_at: DateTime<Utc>,
    log_id: String,
}

impl LogsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidInput("invalid logs cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidInput("invalid logs cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidInput("invalid logs cursor".to_string()))
    }
}

impl Engine {
    async fn require_account_by_code(
        &self,
        db_tx: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<StudentAccount> {
        let code = normalize_code(code)?;
        let model = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        StudentAccount::try_from(model)
    }

    async fn require_account_by_student(
        &self,
        db_tx: &DatabaseTransaction,
        student_id: Uuid,
    ) -> ResultEngine<StudentAccount> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::StudentId.eq(student_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        StudentAccount::try_from(model)
    }

    async fn append_log(
        &self,
        db_tx: &DatabaseTransaction,
        account: &StudentAccount,
        log: &AccountLog,
    ) -> ResultEngine<()> {
        account_logs::ActiveModel::from(log).insert(db_tx).await?;
        let model = accounts::ActiveModel {
            id: ActiveValue::Set(account.id.to_string()),
            balance_minor: ActiveValue::Set(account.balance_minor + log.amount_minor),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(())
    }

    async fn append_positive(
        &self,
        code: &str,
        amount_minor: i64,
        kind: LogKind,
        note: Option<String>,
        performer: &Performer,
    ) -> ResultEngine<AccountLog> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidInput(
                "amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let account = self.require_account_by_code(&db_tx, code).await?;
            if !account.active {
                return Err(EngineError::Inactive("account is disabled".to_string()));
            }
            let log = AccountLog::new(
                account.id,
                amount_minor,
                kind,
                note,
                performer,
                self.clock().now_utc(),
            );
            self.append_log(&db_tx, &account, &log).await?;
            Ok(log)
        })
    }

    /// Appends a top-up row and increases the materialized balance.
    pub async fn top_up(
        &self,
        code: &str,
        amount_minor: i64,
        note: Option<String>,
        performer: &Performer,
    ) -> ResultEngine<AccountLog> {
        self.append_positive(code, amount_minor, LogKind::TopUp, note, performer)
            .await
    }

    /// Appends a compensating refund row.
    pub async fn refund(
        &self,
        code: &str,
        amount_minor: i64,
        note: Option<String>,
        performer: &Performer,
    ) -> ResultEngine<AccountLog> {
        self.append_positive(code, amount_minor, LogKind::Refund, note, performer)
            .await
    }

    /// Charges one student for one group's monthly fee.
    ///
    /// Safe to call twice for the same (student, group, month, year): the
    /// existing charge row is detected via its period key and the second
    /// call no-ops. An insufficient balance flips the enrollment to pending
    /// and surfaces `InsufficientFunds`; no ledger row is written.
    pub async fn charge_for_group(
        &self,
        student_id: Uuid,
        group_id: Uuid,
        period: Period,
        performer: &Performer,
    ) -> ResultEngine<ChargeOutcome> {
        let period_key = charge_period_key(group_id, period);

        let db_tx = self.database.begin().await?;
        let group = self.require_group(&db_tx, group_id).await?;
        let enrollment = self.require_enrollment(&db_tx, student_id, group_id).await?;
        let account = self.require_account_by_student(&db_tx, student_id).await?;
        if !account.active {
            return Err(EngineError::Inactive("account is disabled".to_string()));
        }

        let existing = account_logs::Entity::find()
            .filter(account_logs::Column::AccountId.eq(account.id.to_string()))
            .filter(account_logs::Column::PeriodKey.eq(period_key.clone()))
            .one(&db_tx)
            .await?;
        if existing.is_some() {
            db_tx.commit().await?;
            return Ok(ChargeOutcome::AlreadyCharged);
        }

        let due = Self::amount_due(&group, &enrollment);
        if due == 0 {
            self.set_payment_status(&db_tx, &enrollment.id, PaymentStatus::Paid)
                .await?;
            db_tx.commit().await?;
            return Ok(ChargeOutcome::NothingDue);
        }

        if account.balance_minor < due {
            // The failed attempt is recorded as a pending payment status,
            // not as a ledger row; the log stays the exact sum of balance
            // changes. The commit must survive the error return.
            self.set_payment_status(&db_tx, &enrollment.id, PaymentStatus::Pending)
                .await?;
            db_tx.commit().await?;
            self.notify_payment(student_id, group_id, PaymentStatus::Pending, due, period);
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} is below the amount due {due}",
                account.balance_minor
            )));
        }

        let mut log = AccountLog::new(
            account.id,
            -due,
            LogKind::Charge,
            Some(format!("monthly fee for {}", group.name)),
            performer,
            self.clock().now_utc(),
        );
        log.group_id = Some(group_id);
        log.period_key = Some(period_key);
        self.append_log(&db_tx, &account, &log).await?;
        self.set_payment_status(&db_tx, &enrollment.id, PaymentStatus::Paid)
            .await?;
        db_tx.commit().await?;

        self.notify_payment(student_id, group_id, PaymentStatus::Paid, due, period);
        Ok(ChargeOutcome::Charged { amount_minor: due })
    }

    async fn set_payment_status(
        &self,
        db_tx: &DatabaseTransaction,
        enrollment_id: &Uuid,
        status: PaymentStatus,
    ) -> ResultEngine<()> {
        let model = enrollments::ActiveModel {
            id: ActiveValue::Set(enrollment_id.to_string()),
            payment_status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(())
    }

    /// Best-effort: a failed notification is logged and never affects the
    /// financial write it follows.
    fn notify_payment(
        &self,
        student_id: Uuid,
        group_id: Uuid,
        status: PaymentStatus,
        amount_minor: i64,
        period: Period,
    ) {
        let event = PaymentEvent {
            student_id: student_id.to_string(),
            group_id: group_id.to_string(),
            status,
            amount_minor,
            month: period.month(),
            year: period.year(),
        };
        if let Err(err) = self.notifier.payment_status_changed(&event) {
            tracing::warn!(student = %event.student_id, "payment notification failed: {err}");
        }
    }

    /// Charges every active enrollment of one group for the month.
    pub async fn run_group_charge(
        &self,
        group_id: Uuid,
        period: Period,
        performer: &Performer,
    ) -> ResultEngine<BatchOutcome> {
        let pairs = with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.active_enrollment_pairs(&db_tx).await
        })?;

        let selected = pairs.into_iter().filter(|(_, g)| *g == group_id);
        self.charge_pairs(selected, period, performer).await
    }

    /// The monthly unit of work: charge every active (student, group) pair.
    pub async fn run_monthly_charge(
        &self,
        period: Period,
        performer: &Performer,
    ) -> ResultEngine<BatchOutcome> {
        let pairs = with_tx!(self, |db_tx| self.active_enrollment_pairs(&db_tx).await)?;
        self.charge_pairs(pairs.into_iter(), period, performer).await
    }

    async fn charge_pairs(
        &self,
        pairs: impl Iterator<Item = (Uuid, Uuid)>,
        period: Period,
        performer: &Performer,
    ) -> ResultEngine<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for (student_id, group_id) in pairs {
            match self.charge_for_group(student_id, group_id, period, performer).await {
                Ok(ChargeOutcome::Charged { .. }) => outcome.success(),
                Ok(ChargeOutcome::AlreadyCharged | ChargeOutcome::NothingDue) => outcome.skip(),
                Err(err) => outcome.fail(format!("{student_id}:{group_id}"), &err),
            }
        }
        Ok(outcome)
    }

    /// The account behind a code, with its materialized balance.
    pub async fn account_balance(&self, code: &str) -> ResultEngine<StudentAccount> {
        with_tx!(self, |db_tx| self.require_account_by_code(&db_tx, code).await)
    }

    /// Recent log rows, newest first, with cursor-based pagination by
    /// `(created_at DESC, id DESC)`.
    pub async fn recent_logs(
        &self,
        code: &str,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<AccountLog>, Option<String>)> {
        with_tx!(self, |db_tx| {
            let account = self.require_account_by_code(&db_tx, code).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = account_logs::Entity::find()
                .filter(account_logs::Column::AccountId.eq(account.id.to_string()))
                .order_by_desc(account_logs::Column::CreatedAt)
                .order_by_desc(account_logs::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = LogsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(account_logs::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(account_logs::Column::CreatedAt.eq(cursor.created_at))
                                .add(account_logs::Column::Id.lt(cursor.log_id)),
                        ),
                );
            }

            let rows: Vec<account_logs::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<AccountLog> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(AccountLog::try_from(model)?);
            }

            let next_cursor = out.last().map(|log| LogsCursor {
                created_at: log.created_at,
                log_id: log.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Replays the full log and returns `(stored, replayed)` balances so
    /// callers can compare and repair drift.
    pub async fn recompute_balance(&self, code: &str) -> ResultEngine<(i64, i64)> {
        with_tx!(self, |db_tx| {
            let account = self.require_account_by_code(&db_tx, code).await?;
            let rows: Vec<account_logs::Model> = account_logs::Entity::find()
                .filter(account_logs::Column::AccountId.eq(account.id.to_string()))
                .all(&db_tx)
                .await?;
            let replayed: i64 = rows.iter().map(|r| r.amount_minor).sum();
            Ok((account.balance_minor, replayed))
        })
    }
}
