//! Completion ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a completion
///
/// The only transition is pending -> paid; paid records are eventually
/// garbage-collected by the ledger's retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Paid,
}

/// A recorded offer completion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub offer_id: String,
    /// Denormalized from the offer so the record outlives catalog edits
    pub title: String,
    pub payout: f64,
    pub completed_at: DateTime<Utc>,
    pub status: CompletionStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl CompletionRecord {
    pub fn is_pending(&self) -> bool {
        self.status == CompletionStatus::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.status == CompletionStatus::Paid
    }

    /// Whole days since payout, for "deletes in N days" displays
    pub fn days_since_paid(&self, now: DateTime<Utc>) -> Option<i64> {
        self.paid_at.map(|paid| (now - paid).num_days())
    }
}

/// Persisted ledger document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default)]
    pub completed: Vec<CompletionRecord>,
}
