//! CLI administration tool for napstopper.
//!
//! Webhook handling never fails a signed delivery; mismatches are logged for
//! manual follow-up instead. This tool is that follow-up: inspect users,
//! force a plan or subscription status, reset a top-up cooldown, and check
//! the database without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List users
//! cargo run --bin admin -- user list
//!
//! # Show a user with links and subscription history
//! cargo run --bin admin -- user show someone@example.com
//!
//! # Force plan and status after a missed webhook
//! cargo run --bin admin -- user set-plan someone@example.com paid active
//!
//! # Allow an immediate credit top-up
//! cargo run --bin admin -- user reset-cooldown someone@example.com
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string

use napstopper::domain::entities::{Plan, SubscriptionStatus, User};
use napstopper::domain::repositories::{LinkRepository, SubscriptionRepository, UserRepository};
use napstopper::infrastructure::persistence::{
    PgLinkRepository, PgSubscriptionRepository, PgUserRepository,
};
use napstopper::utils::format::format_thousands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing napstopper.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and repair users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// User management subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// List users, newest first
    List {
        /// Page size
        #[arg(short, long, default_value_t = 25)]
        limit: i64,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },

    /// Show one user with links and latest subscription
    Show {
        email: String,
    },

    /// Force plan and subscription status
    SetPlan {
        email: String,

        /// `free` or `paid`
        plan: String,

        /// `none`, `created`, `active`, `cancelled`, `paused`,
        /// `scheduled_cancel`, `past_due` or `completed`
        status: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Clear the last top-up time so credit can be added immediately
    ResetCooldown {
        email: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches user management commands.
async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let users = PgUserRepository::new(pool.clone());

    match action {
        UserAction::List { limit, page } => list_users(&users, limit, page).await?,
        UserAction::Show { email } => {
            let links = PgLinkRepository::new(pool.clone());
            let subscriptions = PgSubscriptionRepository::new(pool);
            show_user(&users, &links, &subscriptions, &email).await?;
        }
        UserAction::SetPlan {
            email,
            plan,
            status,
            yes,
        } => set_plan(&users, &email, &plan, &status, yes).await?,
        UserAction::ResetCooldown { email } => reset_cooldown(&users, &email).await?,
    }

    Ok(())
}

/// Lists users with plan and balance.
///
/// # Output Format
///
/// ```text
/// 👥 Users
///
///   ID    Email                              Plan   Status            Credit
///   ───────────────────────────────────────────────────────────────────────────
///   12    someone@example.com                paid   active            21,600
/// ```
async fn list_users(users: &PgUserRepository, limit: i64, page: i64) -> Result<()> {
    println!("{}", "👥 Users".bright_blue().bold());
    println!();

    let limit = limit.clamp(1, 500);
    let offset = (page.max(1) - 1) * limit;

    let list = users
        .list(limit, offset)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;
    let total = users
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count users: {}", e))?;

    if list.is_empty() {
        println!("{}", "  No users found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<34} {:<6} {:<17} {:>10}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Plan".bright_white().bold(),
        "Status".bright_white().bold(),
        "Credit".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for user in &list {
        println!(
            "  {:<5} {:<34} {:<6} {:<17} {:>10}",
            user.id.to_string().bright_black(),
            user.email.cyan(),
            plan_label(user.plan),
            user.subscription_status.as_str(),
            format_thousands(user.credit)
        );
    }

    println!();
    println!(
        "  Showing {} of {}",
        list.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn show_user(
    users: &PgUserRepository,
    links: &PgLinkRepository,
    subscriptions: &PgSubscriptionRepository,
    email: &str,
) -> Result<()> {
    let user = find_user(users, email).await?;

    println!("{}", "👤 User".bright_blue().bold());
    println!();
    print_user(&user);

    let user_links = links
        .list_by_user(user.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    println!();
    println!("{}", "  Links:".bright_white().bold());
    if user_links.is_empty() {
        println!("    {}", "none".bright_black());
    }
    for link in &user_links {
        let last_ping = link
            .last_ping
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "    {:<5} {:<50} pings {:<6} last {}",
            link.id.to_string().bright_black(),
            link.url.cyan(),
            link.ping_count,
            last_ping.bright_black()
        );
    }

    let latest = subscriptions
        .find_latest_for_user(user.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read subscription history: {}", e))?;

    println!();
    println!("{}", "  Latest subscription:".bright_white().bold());
    match latest {
        Some(sub) => println!(
            "    {} {} via {} ({}), updated {}",
            sub.external_id.cyan(),
            sub.status.as_str(),
            sub.provider,
            sub.plan_type,
            sub.updated_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("    {}", "none".bright_black()),
    }
    println!();

    Ok(())
}

/// Forces plan and status, e.g. after a webhook that matched no user.
///
/// # Safety
///
/// - Requires confirmation unless `--yes` is given
/// - Does not touch the payment provider
async fn set_plan(
    users: &PgUserRepository,
    email: &str,
    plan: &str,
    status: &str,
    skip_confirm: bool,
) -> Result<()> {
    let plan: Plan = plan.parse().map_err(anyhow::Error::msg)?;
    let status: SubscriptionStatus = status.parse().map_err(anyhow::Error::msg)?;

    let user = find_user(users, email).await?;

    println!("{}", "🛠  Set Plan".bright_blue().bold());
    println!();
    println!(
        "  {}  {} / {}  →  {} / {}",
        user.email.cyan(),
        user.plan.as_str(),
        user.subscription_status.as_str(),
        plan.as_str().bright_yellow(),
        status.as_str().bright_yellow()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Apply this change?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let updated = users
        .set_subscription_state(email, Some(plan), status)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update user: {}", e))?
        .context("User not found")?;

    println!("{}", "✅ User updated".green().bold());
    println!();
    print_user(&updated);
    println!();

    Ok(())
}

async fn reset_cooldown(users: &PgUserRepository, email: &str) -> Result<()> {
    let reset = users
        .reset_topup_cooldown(email)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reset cooldown: {}", e))?;

    if reset {
        println!("{}", "✅ Top-up cooldown cleared".green().bold());
    } else {
        println!("{}", "⚠️  User not found".yellow());
    }

    Ok(())
}

async fn find_user(users: &PgUserRepository, email: &str) -> Result<User> {
    users
        .find_by_email(email)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("User not found")
}

fn print_user(user: &User) {
    let last_topup = user
        .last_credit_topup_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("  ID:           {}", user.id.to_string().bright_black());
    println!("  Email:        {}", user.email.cyan());
    println!("  Credit:       {}", format_thousands(user.credit).bright_green());
    println!("  Plan:         {}", plan_label(user.plan));
    println!("  Status:       {}", user.subscription_status.as_str());
    println!(
        "  Subscription: {}",
        user.subscription_id.as_deref().unwrap_or("-")
    );
    println!("  Last top-up:  {}", last_topup);
    println!(
        "  Created:      {}",
        user.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
}

fn plan_label(plan: Plan) -> ColoredString {
    match plan {
        Plan::Paid => "paid".green(),
        Plan::Free => "free".normal(),
    }
}

/// Displays system statistics.
///
/// Shows:
/// - Users, and how many are on the paid plan
/// - Monitored links and recorded pings
/// - Subscription history rows per status
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let paid_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE plan = 'paid'")
        .fetch_one(pool)
        .await?;

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let pings_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pings")
        .fetch_one(pool)
        .await?;

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM subscriptions GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    println!(
        "  Users:         {}",
        users_count.to_string().bright_green().bold()
    );
    println!(
        "  Paid users:    {}",
        paid_count.to_string().bright_green().bold()
    );
    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Pings:         {}",
        pings_count.to_string().bright_green().bold()
    );

    if !by_status.is_empty() {
        println!();
        println!("{}", "  Subscriptions:".bright_white().bold());
        for (status, count) in by_status {
            println!("    {:<17} {}", status, count.to_string().bright_green());
        }
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
