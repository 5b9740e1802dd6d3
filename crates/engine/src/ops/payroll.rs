//! Payroll calculation and its approval state machine.
//!
//! A month's record is computed from the single active contract, the work
//! logs of the period, and the charge rows attributable to the person's
//! groups. Pending advances settle whole, oldest first, while they fit under
//! gross; recalculating a Draft first releases what it had settled, so an
//! advance is never deducted twice.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Advance, AdvanceStatus, EngineError, PayrollBreakdown, PayrollContract, PayrollRecord,
    PayrollStatus, Period, PersonKind, ResultEngine, WorkLog, account_logs, advances, contracts,
    groups, payroll_records, work_logs,
};

use super::{BatchOutcome, Engine, with_tx};

/// Manual inputs folded into a calculation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayrollInputs {
    pub bonus_minor: i64,
    pub fine_minor: i64,
}

/// Per-center month overview.
#[derive(Clone, Debug)]
pub struct MonthlySummary {
    pub records: Vec<PayrollRecord>,
    pub total_gross_minor: i64,
    pub total_net_minor: i64,
}

impl Engine {
    /// Registers a contract, enforcing at most one active contract per
    /// (person, center) over any instant of its effective range.
    pub async fn create_contract(&self, contract: PayrollContract) -> ResultEngine<PayrollContract> {
        with_tx!(self, |db_tx| {
            let existing: Vec<contracts::Model> = contracts::Entity::find()
                .filter(contracts::Column::PersonId.eq(contract.person_id.clone()))
                .filter(contracts::Column::PersonKind.eq(contract.person_kind.as_str()))
                .filter(contracts::Column::CenterId.eq(contract.center_id.clone()))
                .filter(contracts::Column::Active.eq(true))
                .all(&db_tx)
                .await?;
            for model in existing {
                let other = PayrollContract::try_from(model)?;
                let new_end = contract.effective_to.unwrap_or(NaiveDate::MAX);
                if other.overlaps(contract.effective_from, new_end) {
                    return Err(EngineError::Conflict(
                        "an active contract already covers this range".to_string(),
                    ));
                }
            }
            contracts::ActiveModel::from(&contract).insert(&db_tx).await?;
            Ok(contract)
        })
    }

    /// Closes a contract's effective range so a successor can be created.
    pub async fn end_contract(
        &self,
        contract_id: Uuid,
        effective_to: NaiveDate,
    ) -> ResultEngine<PayrollContract> {
        with_tx!(self, |db_tx| {
            let model = contracts::Entity::find_by_id(contract_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("contract not exists".to_string()))?;
            let mut contract = PayrollContract::try_from(model)?;
            if effective_to < contract.effective_from {
                return Err(EngineError::InvalidInput(
                    "effective_to must not precede effective_from".to_string(),
                ));
            }
            contract.effective_to = Some(effective_to);
            contract.active = false;
            let update = contracts::ActiveModel {
                id: ActiveValue::Set(contract.id.to_string()),
                effective_to: ActiveValue::Set(contract.effective_to),
                active: ActiveValue::Set(false),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(contract)
        })
    }

    /// The single active contract in force during the period.
    async fn active_contract(
        &self,
        db_tx: &DatabaseTransaction,
        person_id: &str,
        person_kind: PersonKind,
        center_id: &str,
        period: Period,
    ) -> ResultEngine<PayrollContract> {
        let models: Vec<contracts::Model> = contracts::Entity::find()
            .filter(contracts::Column::PersonId.eq(person_id))
            .filter(contracts::Column::PersonKind.eq(person_kind.as_str()))
            .filter(contracts::Column::CenterId.eq(center_id))
            .filter(contracts::Column::Active.eq(true))
            .all(db_tx)
            .await?;

        let mut matching = Vec::new();
        for model in models {
            let contract = PayrollContract::try_from(model)?;
            if contract.overlaps(period.first_day(), period.last_day()) {
                matching.push(contract);
            }
        }
        match matching.len() {
            0 => Err(EngineError::KeyNotFound(
                "no active contract for this period".to_string(),
            )),
            1 => Ok(matching.remove(0)),
            _ => Err(EngineError::Conflict(
                "several active contracts cover this period".to_string(),
            )),
        }
    }

    /// Rejects work-log writes once the month's payroll left Draft.
    async fn ensure_month_open(
        &self,
        db_tx: &DatabaseTransaction,
        person_id: &str,
        person_kind: PersonKind,
        period: Period,
    ) -> ResultEngine<()> {
        let frozen = payroll_records::Entity::find()
            .filter(payroll_records::Column::PersonId.eq(person_id))
            .filter(payroll_records::Column::PersonKind.eq(person_kind.as_str()))
            .filter(payroll_records::Column::Month.eq(period.month() as i32))
            .filter(payroll_records::Column::Year.eq(period.year()))
            .filter(payroll_records::Column::Status.ne(PayrollStatus::Draft.as_str()))
            .one(db_tx)
            .await?;
        if frozen.is_some() {
            return Err(EngineError::Conflict(
                "payroll for this month is already approved".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn log_work(
        &self,
        person_id: &str,
        person_kind: PersonKind,
        date: NaiveDate,
        minutes: u32,
        group_id: Option<Uuid>,
    ) -> ResultEngine<WorkLog> {
        let log = WorkLog::new(person_id.to_string(), person_kind, date, minutes, group_id)?;
        with_tx!(self, |db_tx| {
            self.ensure_month_open(&db_tx, person_id, person_kind, Period::of(date))
                .await?;
            work_logs::ActiveModel::from(&log).insert(&db_tx).await?;
            Ok(log)
        })
    }

    pub async fn update_work_log(
        &self,
        work_log_id: Uuid,
        date: NaiveDate,
        minutes: u32,
        group_id: Option<Uuid>,
    ) -> ResultEngine<WorkLog> {
        if minutes == 0 {
            return Err(EngineError::InvalidInput(
                "minutes must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let model = work_logs::Entity::find_by_id(work_log_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("work log not exists".to_string()))?;
            let mut log = WorkLog::try_from(model)?;

            // Both the old and the new month must still be open.
            let old_period = Period::new(log.month, log.year)?;
            self.ensure_month_open(&db_tx, &log.person_id, log.person_kind, old_period)
                .await?;
            self.ensure_month_open(&db_tx, &log.person_id, log.person_kind, Period::of(date))
                .await?;

            log.date = date;
            log.minutes = minutes;
            log.group_id = group_id;
            log.month = Period::of(date).month();
            log.year = Period::of(date).year();

            let update = work_logs::ActiveModel {
                id: ActiveValue::Set(log.id.to_string()),
                date: ActiveValue::Set(log.date),
                minutes: ActiveValue::Set(log.minutes as i32),
                group_id: ActiveValue::Set(log.group_id.map(|id| id.to_string())),
                month: ActiveValue::Set(log.month as i32),
                year: ActiveValue::Set(log.year),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(log)
        })
    }

    pub async fn delete_work_log(&self, work_log_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = work_logs::Entity::find_by_id(work_log_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("work log not exists".to_string()))?;
            let log = WorkLog::try_from(model)?;
            self.ensure_month_open(
                &db_tx,
                &log.person_id,
                log.person_kind,
                Period::new(log.month, log.year)?,
            )
            .await?;
            work_logs::Entity::delete_by_id(log.id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub async fn grant_advance(
        &self,
        person_id: &str,
        person_kind: PersonKind,
        center_id: &str,
        amount_minor: i64,
        period: Period,
    ) -> ResultEngine<Advance> {
        let advance = Advance::new(
            person_id.to_string(),
            person_kind,
            center_id.to_string(),
            amount_minor,
            period,
            self.clock().now_utc(),
        )?;
        with_tx!(self, |db_tx| {
            advances::ActiveModel::from(&advance).insert(&db_tx).await?;
            Ok(advance)
        })
    }

    /// Cancels a pending advance; settled or cancelled ones cannot move.
    pub async fn cancel_advance(&self, advance_id: Uuid) -> ResultEngine<Advance> {
        with_tx!(self, |db_tx| {
            let model = advances::Entity::find_by_id(advance_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("advance not exists".to_string()))?;
            let mut advance = Advance::try_from(model)?;
            if advance.status != AdvanceStatus::Pending {
                return Err(EngineError::InvalidTransition(format!(
                    "advance is {}, only pending advances can be cancelled",
                    advance.status.as_str()
                )));
            }
            advance.status = AdvanceStatus::Cancelled;
            let update = advances::ActiveModel {
                id: ActiveValue::Set(advance.id.to_string()),
                status: ActiveValue::Set(advance.status.as_str().to_string()),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(advance)
        })
    }

    /// Sum of charge rows attributable to the person's groups in the period.
    async fn attributable_payments(
        &self,
        db_tx: &DatabaseTransaction,
        person_id: &str,
        person_kind: PersonKind,
        period: Period,
    ) -> ResultEngine<i64> {
        if person_kind != PersonKind::Mentor {
            return Ok(0);
        }
        let group_ids: Vec<String> = groups::Entity::find()
            .filter(groups::Column::MentorId.eq(person_id))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        if group_ids.is_empty() {
            return Ok(0);
        }

        let rows: Vec<account_logs::Model> = account_logs::Entity::find()
            .filter(account_logs::Column::Kind.eq(crate::LogKind::Charge.as_str()))
            .filter(account_logs::Column::GroupId.is_in(group_ids))
            .filter(account_logs::Column::PeriodKey.like(format!("%:{}", period.key()).as_str()))
            .all(db_tx)
            .await?;
        // Charge rows are negative; payments received are their magnitude.
        Ok(rows.iter().map(|r| -r.amount_minor).sum())
    }

    /// Computes (or recomputes) the Draft record for one person and month.
    pub async fn calculate_payroll(
        &self,
        person_id: &str,
        person_kind: PersonKind,
        center_id: &str,
        period: Period,
        inputs: PayrollInputs,
    ) -> ResultEngine<PayrollRecord> {
        if inputs.bonus_minor < 0 || inputs.fine_minor < 0 {
            return Err(EngineError::InvalidInput(
                "bonus and fine must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let contract = self
                .active_contract(&db_tx, person_id, person_kind, center_id, period)
                .await?;

            let existing = payroll_records::Entity::find()
                .filter(payroll_records::Column::PersonId.eq(person_id))
                .filter(payroll_records::Column::PersonKind.eq(person_kind.as_str()))
                .filter(payroll_records::Column::CenterId.eq(center_id))
                .filter(payroll_records::Column::Month.eq(period.month() as i32))
                .filter(payroll_records::Column::Year.eq(period.year()))
                .one(&db_tx)
                .await?;
            let existing = existing.map(PayrollRecord::try_from).transpose()?;
            if let Some(record) = &existing
                && record.status != PayrollStatus::Draft
            {
                return Err(EngineError::Conflict(format!(
                    "record is {}, only drafts can be recalculated",
                    record.status.as_str()
                )));
            }
            let record_id = existing.as_ref().map_or_else(Uuid::new_v4, |r| r.id);

            // Release advances this draft had settled before re-evaluating,
            // so a recalculation never deducts the same advance twice.
            let settled: Vec<advances::Model> = advances::Entity::find()
                .filter(advances::Column::SettledBy.eq(record_id.to_string()))
                .all(&db_tx)
                .await?;
            for model in settled {
                let release = advances::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    status: ActiveValue::Set(AdvanceStatus::Pending.as_str().to_string()),
                    settled_by: ActiveValue::Set(None),
                    ..Default::default()
                };
                release.update(&db_tx).await?;
            }

            let minutes: u32 = {
                let rows: Vec<work_logs::Model> = work_logs::Entity::find()
                    .filter(work_logs::Column::PersonId.eq(person_id))
                    .filter(work_logs::Column::PersonKind.eq(person_kind.as_str()))
                    .filter(work_logs::Column::Month.eq(period.month() as i32))
                    .filter(work_logs::Column::Year.eq(period.year()))
                    .all(&db_tx)
                    .await?;
                rows.iter().map(|r| r.minutes.max(0) as u32).sum()
            };

            let hourly_minor = contract.hourly_rate_minor * i64::from(minutes) / 60;
            let payments = self
                .attributable_payments(&db_tx, person_id, person_kind, period)
                .await?;
            let percentage_minor = payments * contract.percentage_bp / 10_000;

            let gross_minor =
                contract.fixed_minor + hourly_minor + percentage_minor + inputs.bonus_minor;

            // Settle pending advances oldest first, whole or not at all,
            // capped by gross.
            let pending: Vec<advances::Model> = advances::Entity::find()
                .filter(advances::Column::PersonId.eq(person_id))
                .filter(advances::Column::PersonKind.eq(person_kind.as_str()))
                .filter(advances::Column::CenterId.eq(center_id))
                .filter(advances::Column::Month.eq(period.month() as i32))
                .filter(advances::Column::Year.eq(period.year()))
                .filter(advances::Column::Status.eq(AdvanceStatus::Pending.as_str()))
                .order_by_asc(advances::Column::GrantedAt)
                .order_by_asc(advances::Column::Id)
                .all(&db_tx)
                .await?;

            let mut advance_minor = 0i64;
            for model in pending {
                if advance_minor + model.amount_minor > gross_minor {
                    continue;
                }
                advance_minor += model.amount_minor;
                let settle = advances::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    status: ActiveValue::Set(AdvanceStatus::Settled.as_str().to_string()),
                    settled_by: ActiveValue::Set(Some(record_id.to_string())),
                    ..Default::default()
                };
                settle.update(&db_tx).await?;
            }

            let breakdown = PayrollBreakdown {
                minutes,
                fixed_minor: contract.fixed_minor,
                hourly_minor,
                percentage_minor,
                bonus_minor: inputs.bonus_minor,
                fine_minor: inputs.fine_minor,
                advance_minor,
            };
            let mut record = PayrollRecord::new(
                person_id.to_string(),
                person_kind,
                center_id.to_string(),
                period,
                breakdown,
            );
            record.id = record_id;

            let model = payroll_records::ActiveModel::from(&record);
            if existing.is_some() {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(record)
        })
    }

    async fn transition_record(
        &self,
        record_id: Uuid,
        next: PayrollStatus,
    ) -> ResultEngine<PayrollRecord> {
        with_tx!(self, |db_tx| {
            let model = payroll_records::Entity::find_by_id(record_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("payroll record not exists".to_string())
                })?;
            let mut record = PayrollRecord::try_from(model)?;
            if !record.status.can_transition_to(next) {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot move a {} record to {}",
                    record.status.as_str(),
                    next.as_str()
                )));
            }
            record.status = next;
            let update = payroll_records::ActiveModel {
                id: ActiveValue::Set(record.id.to_string()),
                status: ActiveValue::Set(record.status.as_str().to_string()),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(record)
        })
    }

    pub async fn approve_payroll(&self, record_id: Uuid) -> ResultEngine<PayrollRecord> {
        self.transition_record(record_id, PayrollStatus::Approved).await
    }

    pub async fn mark_payroll_paid(&self, record_id: Uuid) -> ResultEngine<PayrollRecord> {
        self.transition_record(record_id, PayrollStatus::Paid).await
    }

    /// Batch calculation for everyone with an active contract at the center.
    /// Existing drafts keep their bonus/fine inputs; failures are isolated.
    pub async fn calculate_all_for_month(
        &self,
        center_id: &str,
        period: Period,
    ) -> ResultEngine<BatchOutcome> {
        let persons = with_tx!(self, |db_tx| {
            let models: Vec<contracts::Model> = contracts::Entity::find()
                .filter(contracts::Column::CenterId.eq(center_id))
                .filter(contracts::Column::Active.eq(true))
                .all(&db_tx)
                .await?;
            let mut out: Vec<(String, PersonKind, i64, i64)> = Vec::new();
            for model in models {
                let contract = PayrollContract::try_from(model)?;
                if !contract.overlaps(period.first_day(), period.last_day()) {
                    continue;
                }
                if out
                    .iter()
                    .any(|(id, kind, _, _)| *id == contract.person_id && *kind == contract.person_kind)
                {
                    continue;
                }
                let existing = payroll_records::Entity::find()
                    .filter(payroll_records::Column::PersonId.eq(contract.person_id.clone()))
                    .filter(payroll_records::Column::PersonKind.eq(contract.person_kind.as_str()))
                    .filter(payroll_records::Column::CenterId.eq(center_id))
                    .filter(payroll_records::Column::Month.eq(period.month() as i32))
                    .filter(payroll_records::Column::Year.eq(period.year()))
                    .one(&db_tx)
                    .await?;
                let (bonus, fine) = existing
                    .map(|r| (r.bonus_minor, r.fine_minor))
                    .unwrap_or((0, 0));
                out.push((contract.person_id, contract.person_kind, bonus, fine));
            }
            Ok(out)
        })?;

        let mut outcome = BatchOutcome::default();
        for (person_id, person_kind, bonus_minor, fine_minor) in persons {
            let inputs = PayrollInputs {
                bonus_minor,
                fine_minor,
            };
            match self
                .calculate_payroll(&person_id, person_kind, center_id, period, inputs)
                .await
            {
                Ok(_) => outcome.success(),
                Err(EngineError::Conflict(_)) => outcome.skip(),
                Err(err) => outcome.fail(person_id, &err),
            }
        }
        Ok(outcome)
    }

    /// Every record of the center for the month, with gross/net totals.
    pub async fn monthly_summary(
        &self,
        center_id: &str,
        period: Period,
    ) -> ResultEngine<MonthlySummary> {
        with_tx!(self, |db_tx| {
            let models: Vec<payroll_records::Model> = payroll_records::Entity::find()
                .filter(payroll_records::Column::CenterId.eq(center_id))
                .filter(payroll_records::Column::Month.eq(period.month() as i32))
                .filter(payroll_records::Column::Year.eq(period.year()))
                .order_by_asc(payroll_records::Column::PersonId)
                .all(&db_tx)
                .await?;
            let mut records = Vec::with_capacity(models.len());
            for model in models {
                records.push(PayrollRecord::try_from(model)?);
            }
            let total_gross_minor = records.iter().map(|r| r.gross_minor).sum();
            let total_net_minor = records.iter().map(|r| r.net_minor).sum();
            Ok(MonthlySummary {
                records,
                total_gross_minor,
                total_net_minor,
            })
        })
    }
}
