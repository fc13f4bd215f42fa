//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};

/// Payout amount in the offer's currency (for clarity in function signatures)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payout(pub f64);

impl Payout {
    pub fn new(amount: f64) -> Self {
        Payout(amount)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Format for display, e.g. `$25.00`
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl std::ops::Add for Payout {
    type Output = Payout;

    fn add(self, rhs: Payout) -> Payout {
        Payout(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Payout {
    fn sum<I: Iterator<Item = Payout>>(iter: I) -> Payout {
        Payout(iter.map(|p| p.0).sum())
    }
}
