//! Aggregate activity statistics, computed on demand by
//! [`crate::activity::manager::ActivityManager::get_statistics`].

use crate::activity::model::ActivityStatus;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// A snapshot of activity counts and derived rates, as of the moment
/// [`crate::activity::manager::ActivityManager::get_statistics`] was called.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ActivityStatistics {
    pub total: u64,
    pub created: u64,
    pub queued: u64,
    pub running: u64,
    pub paused: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl ActivityStatistics {
    /// Folds one activity's status into the running tally.
    pub fn record(&mut self, status: ActivityStatus) {
        self.total += 1;
        match status {
            ActivityStatus::Created => self.created += 1,
            ActivityStatus::Queued => self.queued += 1,
            ActivityStatus::Running => self.running += 1,
            ActivityStatus::Paused => self.paused += 1,
            ActivityStatus::Completed => self.completed += 1,
            ActivityStatus::Failed => self.failed += 1,
            ActivityStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Fraction of terminal activities that completed successfully, as a
    /// percentage in `[0.0, 100.0]`. High-precision `Decimal` arithmetic
    /// avoids the float rounding error a naive `f64` division would
    /// accumulate over a long-running node's lifetime counters.
    #[must_use]
    pub fn success_rate_percent(&self) -> f32 {
        let terminal = self.completed + self.failed + self.cancelled;
        calculate_percentage_f32(self.completed, terminal)
    }

    /// Fraction of all known activities currently in flight (not yet
    /// terminal).
    #[must_use]
    pub fn in_flight_percent(&self) -> f32 {
        let in_flight = self.created + self.queued + self.running + self.paused;
        calculate_percentage_f32(in_flight, self.total)
    }
}

/// Computes `numerator / denominator * 100` using `Decimal` internally so
/// the only precision loss happens at the final `f32` conversion, not
/// across repeated float division.
#[must_use]
pub fn calculate_percentage_f32(numerator: u64, denominator: u64) -> f32 {
    if denominator == 0 {
        return 0.0;
    }
    let num = Decimal::from(numerator);
    let den = Decimal::from(denominator);
    let hundred = Decimal::from(100);
    ((num / den) * hundred).to_f32().unwrap_or(0.0)
}
