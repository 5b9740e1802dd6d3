//! Best-effort notification dispatch.
//!
//! The ledger reports payment-status changes through [`Notifier`]; actual
//! delivery (SMS/Telegram/email) lives outside this crate. A failed
//! notification is logged and dropped; it must never fail or roll back the
//! financial write it follows.

use thiserror::Error;

use crate::enrollments::PaymentStatus;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Payment-status change event, as seen by delivery channels.
#[derive(Clone, Debug)]
pub struct PaymentEvent {
    pub student_id: String,
    pub group_id: String,
    pub status: PaymentStatus,
    pub amount_minor: i64,
    pub month: u32,
    pub year: i32,
}

pub trait Notifier: Send + Sync {
    fn payment_status_changed(&self, event: &PaymentEvent) -> Result<(), NotifyError>;
}

/// Default sink: logs the event and succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn payment_status_changed(&self, event: &PaymentEvent) -> Result<(), NotifyError> {
        tracing::info!(
            student = %event.student_id,
            group = %event.group_id,
            status = event.status.as_str(),
            "payment status changed"
        );
        Ok(())
    }
}
