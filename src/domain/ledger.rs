//! Credit ledger rules.
//!
//! Pure evaluation of a credit top-up against the balance ceiling and the
//! optional cooldown between top-ups. Persistence re-checks the same guards
//! inside the `UPDATE` so concurrent requests cannot slip past them.

use chrono::{DateTime, Duration, Utc};

/// Named credit constants. Values come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPolicy {
    /// Balance given to newly created users.
    pub starting_credit: i64,
    /// Fixed amount added per top-up.
    pub increment: i64,
    /// Upper bound of any stored balance.
    pub max_credit: i64,
    /// Minimum time between two top-ups; `None` disables the cooldown.
    pub cooldown: Option<Duration>,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            starting_credit: 21_600,
            increment: 2_000,
            max_credit: 25_000,
            cooldown: Some(Duration::hours(24)),
        }
    }
}

/// An accepted top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUp {
    pub previous: i64,
    pub added: i64,
    pub new_balance: i64,
    /// Timestamp to store as the last top-up, when the cooldown is enabled.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Why a top-up was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUpRejection {
    CoolingDown {
        last_topup_at: DateTime<Utc>,
        next_available_at: DateTime<Utc>,
        hours_remaining: i64,
    },
    CeilingExceeded {
        current: i64,
        increment: i64,
        would_result_in: i64,
        maximum: i64,
        remaining_capacity: i64,
    },
}

impl CreditPolicy {
    /// Decides whether `increment` may be added to `current` at `now`.
    ///
    /// The cooldown is checked before the ceiling. A top-up exactly
    /// `cooldown` after the previous one is accepted.
    pub fn evaluate(
        &self,
        current: i64,
        last_topup_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<TopUp, TopUpRejection> {
        if let (Some(cooldown), Some(last)) = (self.cooldown, last_topup_at) {
            let next_available_at = last + cooldown;
            if now < next_available_at {
                return Err(TopUpRejection::CoolingDown {
                    last_topup_at: last,
                    next_available_at,
                    hours_remaining: hours_ceil(next_available_at - now),
                });
            }
        }

        let would_result_in = current.saturating_add(self.increment);
        if would_result_in > self.max_credit {
            return Err(TopUpRejection::CeilingExceeded {
                current,
                increment: self.increment,
                would_result_in,
                maximum: self.max_credit,
                remaining_capacity: (self.max_credit - current).max(0),
            });
        }

        Ok(TopUp {
            previous: current,
            added: self.increment,
            new_balance: would_result_in,
            recorded_at: self.cooldown.map(|_| now),
        })
    }

    /// Latest `last_topup_at` that still allows a top-up at `now`.
    pub fn cooldown_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cooldown.map(|c| now - c)
    }

    /// Headroom left under the ceiling for a given balance.
    pub fn remaining_capacity(&self, balance: i64) -> i64 {
        (self.max_credit - balance).max(0)
    }
}

/// Whole hours, rounded up.
fn hours_ceil(d: Duration) -> i64 {
    let secs = d.num_seconds().max(0);
    (secs + 3599) / 3600
}
