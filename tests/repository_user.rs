//! PostgreSQL repository tests. Run with a database:
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use napstopper::domain::entities::{NewUser, Plan, SubscriptionStatus, Transition};
use napstopper::domain::repositories::{CreditTopUp, UserRepository};
use napstopper::error::AppError;
use napstopper::infrastructure::persistence::PgUserRepository;

async fn seed(repo: &PgUserRepository, email: &str, credit: i64) {
    repo.create(NewUser {
        email: email.to_string(),
        credit,
    })
    .await
    .unwrap();
}

fn top_up(email: &str, cutoff: Option<chrono::DateTime<Utc>>) -> CreditTopUp {
    CreditTopUp {
        email: email.to_string(),
        amount: 2_000,
        max_credit: 25_000,
        cooldown_cutoff: cutoff,
        recorded_at: Some(Utc::now()),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));

    let user = repo
        .create(NewUser {
            email: "a@b.com".to_string(),
            credit: 21_600,
        })
        .await
        .unwrap();

    assert_eq!(user.credit, 21_600);
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::None);

    let found = repo.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert!(repo.find_by_email("c@d.com").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_duplicate_email(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));
    seed(&repo, "a@b.com", 0).await;

    let result = repo
        .create(NewUser {
            email: "a@b.com".to_string(),
            credit: 0,
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_top_up_guards(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));
    seed(&repo, "a@b.com", 20_000).await;

    let cutoff = Utc::now() - Duration::hours(24);

    let updated = repo
        .apply_credit_top_up(top_up("a@b.com", Some(cutoff)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.credit, 22_000);
    assert!(updated.last_credit_topup_at.is_some());

    // Cooldown: the previous top-up is newer than the cutoff.
    let blocked = repo
        .apply_credit_top_up(top_up("a@b.com", Some(cutoff)))
        .await
        .unwrap();
    assert!(blocked.is_none());

    // Ceiling: 24,000 + 2,000 > 25,000.
    seed(&repo, "c@d.com", 24_000).await;
    let blocked = repo
        .apply_credit_top_up(top_up("c@d.com", None))
        .await
        .unwrap();
    assert!(blocked.is_none());
    assert_eq!(
        repo.find_by_email("c@d.com").await.unwrap().unwrap().credit,
        24_000
    );
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_subscription_lifecycle(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));
    seed(&repo, "a@b.com", 0).await;
    let user = repo.find_by_email("a@b.com").await.unwrap().unwrap();

    repo.attach_subscription(user.id, "txn_1", SubscriptionStatus::Created)
        .await
        .unwrap();
    assert_eq!(repo.rebind_subscription("txn_1", "sub_1").await.unwrap(), 1);

    let applied = repo
        .apply_transition(
            "sub_1",
            Transition::new(Some(Plan::Paid), SubscriptionStatus::Active),
        )
        .await
        .unwrap();
    assert_eq!(applied, 1);

    let unmatched = repo
        .apply_transition(
            "sub_unknown",
            Transition::new(Some(Plan::Paid), SubscriptionStatus::Active),
        )
        .await
        .unwrap();
    assert_eq!(unmatched, 0);

    // plan: None keeps the paid plan.
    let user = repo
        .set_subscription_state("a@b.com", None, SubscriptionStatus::ScheduledCancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.plan, Plan::Paid);
    assert_eq!(user.subscription_status, SubscriptionStatus::ScheduledCancel);
    assert_eq!(user.subscription_id.as_deref(), Some("sub_1"));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_terminal_status_ignores_stale_transitions(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));
    seed(&repo, "a@b.com", 0).await;
    let user = repo.find_by_email("a@b.com").await.unwrap().unwrap();
    repo.attach_subscription(user.id, "sub_1", SubscriptionStatus::Created)
        .await
        .unwrap();

    let cancel = Transition::new(Some(Plan::Free), SubscriptionStatus::Cancelled);
    let activate = Transition::new(Some(Plan::Paid), SubscriptionStatus::Active);

    assert_eq!(repo.apply_transition("sub_1", cancel).await.unwrap(), 1);
    assert_eq!(repo.apply_transition("sub_1", activate).await.unwrap(), 0);
    // A repeated terminal delivery is still accepted.
    assert_eq!(repo.apply_transition("sub_1", cancel).await.unwrap(), 1);

    let user = repo.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::Cancelled);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reset_topup_cooldown(pool: PgPool) {
    let repo = PgUserRepository::new(Arc::new(pool));
    seed(&repo, "a@b.com", 0).await;
    repo.apply_credit_top_up(top_up("a@b.com", None))
        .await
        .unwrap();

    assert!(repo.reset_topup_cooldown("a@b.com").await.unwrap());
    assert!(!repo.reset_topup_cooldown("c@d.com").await.unwrap());

    let user = repo.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(user.last_credit_topup_at.is_none());
}
