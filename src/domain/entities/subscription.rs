//! Plans, subscription states and the webhook-driven state machine.
//!
//! Payment providers report lifecycle changes as webhook events. Provider
//! adapters translate their payloads into a [`SubscriptionEventKind`], and
//! [`SubscriptionEventKind::transition`] is the single table deciding what
//! happens to the user's `plan` and `subscription_status`:
//!
//! | Event                               | plan        | status             |
//! |-------------------------------------|-------------|--------------------|
//! | activated / resumed                 | paid        | active             |
//! | cancelled                           | free        | cancelled          |
//! | paused                              | free        | paused             |
//! | past_due                            | free        | past_due           |
//! | completed                           | free        | completed          |
//! | updated + scheduled cancel          | unchanged   | scheduled_cancel   |
//! | updated + active, no scheduled change | paid      | active             |
//!
//! `cancelled` and `completed` are terminal. Deliveries can arrive late or be
//! retried, so a terminal status is only ever replaced by another terminal
//! status ([`Transition::applies_to`]); a stale `activated` cannot revive a
//! finished subscription. Checkout attaches a fresh subscription id instead.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Billing tier. `free` is link-quota limited, `paid` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    Free,
    Paid,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Paid => "paid",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "paid" => Ok(Plan::Paid),
            other => Err(format!("unknown plan '{other}'")),
        }
    }
}

/// Lifecycle state of a user's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    None,
    Created,
    Active,
    Cancelled,
    Paused,
    ScheduledCancel,
    PastDue,
    Completed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Created => "created",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::ScheduledCancel => "scheduled_cancel",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Completed => "completed",
        }
    }

    /// Returns true while the user is (or is about to be) billed.
    pub fn is_billing(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::ScheduledCancel
        )
    }

    /// The subscription has ended and will not bill again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Cancelled | SubscriptionStatus::Completed
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SubscriptionStatus::None),
            "created" => Ok(SubscriptionStatus::Created),
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "paused" => Ok(SubscriptionStatus::Paused),
            "scheduled_cancel" => Ok(SubscriptionStatus::ScheduledCancel),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "completed" => Ok(SubscriptionStatus::Completed),
            other => Err(format!("unknown subscription status '{other}'")),
        }
    }
}

/// Provider-agnostic subscription lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEventKind {
    Activated,
    Resumed,
    Cancelled,
    Paused,
    PastDue,
    Completed,
    /// An update that schedules cancellation at the end of the billing cycle.
    CancellationScheduled,
    /// An update leaving the subscription active with nothing scheduled.
    Reactivated,
}

impl SubscriptionEventKind {
    /// The plan/status change this event implies.
    pub fn transition(&self) -> Transition {
        use SubscriptionEventKind::*;

        match self {
            Activated | Resumed | Reactivated => {
                Transition::new(Some(Plan::Paid), SubscriptionStatus::Active)
            }
            Cancelled => Transition::new(Some(Plan::Free), SubscriptionStatus::Cancelled),
            Paused => Transition::new(Some(Plan::Free), SubscriptionStatus::Paused),
            PastDue => Transition::new(Some(Plan::Free), SubscriptionStatus::PastDue),
            Completed => Transition::new(Some(Plan::Free), SubscriptionStatus::Completed),
            CancellationScheduled => Transition::new(None, SubscriptionStatus::ScheduledCancel),
        }
    }

    pub fn as_str(&self) -> &'static str {
        use SubscriptionEventKind::*;

        match self {
            Activated => "activated",
            Resumed => "resumed",
            Cancelled => "cancelled",
            Paused => "paused",
            PastDue => "past_due",
            Completed => "completed",
            CancellationScheduled => "cancellation_scheduled",
            Reactivated => "reactivated",
        }
    }
}

/// Target state for a user row. `plan: None` leaves the plan unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub plan: Option<Plan>,
    pub status: SubscriptionStatus,
}

impl Transition {
    pub fn new(plan: Option<Plan>, status: SubscriptionStatus) -> Self {
        Self { plan, status }
    }

    /// Whether a user currently in `current` may take this transition.
    pub fn applies_to(&self, current: SubscriptionStatus) -> bool {
        !current.is_terminal() || self.status.is_terminal()
    }
}

/// A subscription event addressed by the provider's subscription id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEvent {
    pub subscription_id: String,
    pub kind: SubscriptionEventKind,
}

/// Payment provider that issued a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentProvider {
    Razorpay,
    Paddle,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Razorpay => "razorpay",
            PaymentProvider::Paddle => "paddle",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "razorpay" => Ok(PaymentProvider::Razorpay),
            "paddle" => Ok(PaymentProvider::Paddle),
            other => Err(format!("unknown payment provider '{other}'")),
        }
    }
}

/// Audit row for a subscription created through the API.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub user_id: i64,
    pub provider: PaymentProvider,
    pub external_id: String,
    pub plan_type: String,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for recording a new subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub user_id: i64,
    pub provider: PaymentProvider,
    pub external_id: String,
    pub plan_type: String,
}
